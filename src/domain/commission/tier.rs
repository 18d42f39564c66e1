use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// A half-open band `[min, max)` of performance amount mapped to a rate (percent).
///
/// JSON numbers are read from their literal text, never through `f64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    #[serde(deserialize_with = "rust_decimal::serde::arbitrary_precision::deserialize")]
    pub min: Decimal,
    #[serde(default, deserialize_with = "exact_option")]
    pub max: Option<Decimal>, // None = unbounded
    #[serde(deserialize_with = "rust_decimal::serde::arbitrary_precision::deserialize")]
    pub rate: Decimal,
}

// `arbitrary_precision_option` falls back to the f64 path for `Some`.
fn exact_option<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Exact(
        #[serde(deserialize_with = "rust_decimal::serde::arbitrary_precision::deserialize")] Decimal,
    );

    Ok(Option::<Exact>::deserialize(deserializer)?.map(|Exact(value)| value))
}

impl Tier {
    pub fn new(min: Decimal, max: Option<Decimal>, rate: Decimal) -> Self {
        Self { min, max, rate }
    }

    pub fn bounded(min: Decimal, max: Decimal, rate: Decimal) -> Self {
        Self::new(min, Some(max), rate)
    }

    pub fn unbounded(min: Decimal, rate: Decimal) -> Self {
        Self::new(min, None, rate)
    }

    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min && self.max.is_none_or(|max| amount < max)
    }
}

/// Tiers as entered on a form. Order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierSet {
    tiers: Vec<Tier>,
}

impl TierSet {
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self { tiers }
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Copy of the tiers sorted by `min` (stable for equal bounds).
    pub fn sorted(&self) -> Vec<Tier> {
        let mut tiers = self.tiers.clone();
        tiers.sort_by(|a, b| a.min.cmp(&b.min));
        tiers
    }

    /// Applies `f` to every bound and leaves rates untouched.
    pub fn try_map_bounds<E>(&self, f: impl Fn(Decimal) -> Result<Decimal, E>) -> Result<Self, E> {
        let tiers = self
            .tiers
            .iter()
            .map(|t| Ok(Tier::new(f(t.min)?, t.max.map(&f).transpose()?, t.rate)))
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Self::new(tiers))
    }
}

impl From<Vec<Tier>> for TierSet {
    fn from(tiers: Vec<Tier>) -> Self {
        Self::new(tiers)
    }
}
