use partnerpay::domain::commission::{Tier, TierSet, TieredRateEngine, ValidatedTierSet};
use partnerpay::domain::errors::TierValidationError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn tiers(spec: &[(i64, Option<i64>, i64)]) -> TierSet {
    TierSet::new(
        spec.iter()
            .map(|&(min, max, rate)| Tier::new(Decimal::from(min), max.map(Decimal::from), Decimal::from(rate)))
            .collect(),
    )
}

fn standard() -> ValidatedTierSet {
    TieredRateEngine::validate(&tiers(&[(0, Some(50), 20), (50, Some(100), 25), (100, None, 30)]))
        .unwrap()
}

#[test]
fn test_every_amount_matches_exactly_one_tier() {
    let validated = standard();
    let mut amount = Decimal::ZERO;
    while amount <= dec!(250) {
        let matching: Vec<usize> = validated
            .tiers()
            .iter()
            .enumerate()
            .filter(|(_, t)| t.contains(amount))
            .map(|(i, _)| i + 1)
            .collect();
        assert_eq!(matching.len(), 1, "amount {} matched {:?}", amount, matching);
        assert_eq!(
            TieredRateEngine::evaluate(&validated, amount).tier_index,
            matching[0]
        );
        amount += dec!(0.5);
    }
}

#[test]
fn test_upper_bound_belongs_to_next_tier() {
    let validated = standard();
    for (i, tier) in validated.tiers().iter().enumerate() {
        if let Some(max) = tier.max {
            let lookup = TieredRateEngine::evaluate(&validated, max);
            assert_eq!(lookup.tier_index, i + 2);
            assert_eq!(lookup.rate, validated.tiers()[i + 1].rate);
        }
    }
}

#[test]
fn test_gap_is_non_contiguous() {
    let result = TieredRateEngine::validate(&tiers(&[(0, Some(50), 20), (60, Some(100), 25)]));
    assert_eq!(result, Err(TierValidationError::NonContiguous { index: 2 }));
}

#[test]
fn test_overlap_is_non_contiguous() {
    let result = TieredRateEngine::validate(&tiers(&[(0, Some(60), 20), (50, None, 25)]));
    assert_eq!(result, Err(TierValidationError::NonContiguous { index: 2 }));
}

#[test]
fn test_bad_lower_bound() {
    let result = TieredRateEngine::validate(&tiers(&[(10, Some(50), 20)]));
    assert_eq!(result, Err(TierValidationError::InvalidLowerBound { index: 1 }));
}

#[test]
fn test_inverted_bound() {
    let result = TieredRateEngine::validate(&tiers(&[(0, Some(50), 20), (50, Some(40), 25)]));
    assert_eq!(result, Err(TierValidationError::InvertedBounds { index: 2 }));
}

#[test]
fn test_rate_out_of_range() {
    let result = TieredRateEngine::validate(&tiers(&[(0, Some(50), 20), (50, None, 150)]));
    assert_eq!(result, Err(TierValidationError::RateOutOfRange { index: 2 }));
}

#[test]
fn test_empty_set() {
    assert_eq!(
        TieredRateEngine::validate(&TierSet::default()),
        Err(TierValidationError::EmptyTierSet)
    );
}

#[test]
fn test_two_unbounded_tiers_rejected() {
    let result = TieredRateEngine::validate(&tiers(&[(0, None, 20), (50, None, 25)]));
    assert_eq!(result, Err(TierValidationError::NonContiguous { index: 2 }));
}

#[test]
fn test_error_index_refers_to_sorted_order() {
    // Stored out of order: the gap sits between sorted positions 2 and 3.
    let result = TieredRateEngine::validate(&tiers(&[
        (70, None, 30),
        (0, Some(50), 20),
        (50, Some(60), 25),
    ]));
    assert_eq!(result, Err(TierValidationError::NonContiguous { index: 3 }));
}

#[test]
fn test_scenario_mid_tier() {
    let validated = standard();
    let lookup = TieredRateEngine::evaluate(&validated, dec!(75));
    assert_eq!(lookup.rate, dec!(25));
    assert_eq!(lookup.tier_index, 2);
    assert_eq!(TieredRateEngine::compute_commission(&validated, dec!(75)), dec!(18.75));
}

#[test]
fn test_scenario_boundary_goes_to_unbounded_tier() {
    let validated = standard();
    let lookup = TieredRateEngine::evaluate(&validated, dec!(100));
    assert_eq!(lookup.rate, dec!(30));
    assert_eq!(lookup.tier_index, 3);
    assert_eq!(TieredRateEngine::compute_commission(&validated, dec!(100)), dec!(30.0));
}

#[test]
fn test_scenario_zero() {
    let validated = standard();
    let lookup = TieredRateEngine::evaluate(&validated, dec!(0));
    assert_eq!(lookup.rate, dec!(20));
    assert_eq!(TieredRateEngine::compute_commission(&validated, dec!(0)), dec!(0.0));
}

#[test]
fn test_validated_set_serializes_sorted() {
    let validated = TieredRateEngine::validate(&tiers(&[(50, None, 25), (0, Some(50), 20)])).unwrap();
    let json = serde_json::to_value(&validated).unwrap();
    let first = &json.as_array().unwrap()[0];
    assert_eq!(first["max"], serde_json::json!("50"));
    assert!(json.as_array().unwrap()[1]["max"].is_null());
}
