use super::common::*;
use crate::scoring::aggregator::{aggregate, utility_score, STRENGTH_THRESHOLD};
use crate::scoring::weights::{resolve_weights, WEIGHT_SUM_TOLERANCE};
use crate::scoring::{FactValue, MissingStrategy, WeightSource};

#[test]
fn veto_on_one_criterion_collapses_the_product_score() {
    let config = two_criteria_category();
    let weights = resolve_weights(&config, &[]);

    let vetoed = aggregate(&facts(serde_json::json!({ "c1": 8, "c2": 1 })), &config, &weights);
    let healthy = aggregate(&facts(serde_json::json!({ "c1": 8, "c2": 5 })), &config, &weights);

    let c2 = &vetoed.breakdown[1];
    assert!(c2.is_vetoed);
    assert_eq!(c2.normalized_value, VETO_PENALTY);
    assert!(vetoed.score < healthy.score * 0.5);

    let expected_healthy = 10.0 * 0.8_f64.powf(0.6) * 0.5_f64.powf(0.4);
    assert_close(healthy.score, expected_healthy);
    let expected_vetoed = 10.0 * 0.8_f64.powf(0.6) * (VETO_PENALTY / 10.0).powf(0.4);
    assert_close(vetoed.score, expected_vetoed);
}

#[test]
fn veto_caps_score_by_criterion_weight() {
    let mut config = category(vec![
        linear_criterion("a", 0.7, 0.0, 10.0),
        linear_criterion("b", 0.3, 0.0, 10.0),
    ]);
    config.criteria[1].veto_threshold = Some(5.0);
    let weights = resolve_weights(&config, &[]);

    let result = aggregate(&facts(serde_json::json!({ "a": 10, "b": 1 })), &config, &weights);

    let ceiling = 10.0 * VETO_PENALTY.powf(0.3);
    assert!((ceiling - 2.51).abs() < 0.01);
    assert!(result.score <= ceiling);
    assert_eq!(result.penalties.len(), 1);
    assert_eq!(result.penalties[0].criterion_id, "b");
}

#[test]
fn impute_penalty_scores_the_configured_value() {
    let mut config = two_criteria_category();
    config.criteria[0].impute_value = FactValue::Number(4.0);
    let weights = resolve_weights(&config, &[]);

    let result = aggregate(&facts(serde_json::json!({ "c2": 5 })), &config, &weights);

    let c1 = &result.breakdown[0];
    assert!(c1.imputed);
    assert!(c1.raw_value.is_none());
    assert_close(c1.normalized_value, 4.0);
    assert!(result.excluded_criteria.is_empty());
}

#[test]
fn ignore_reweight_drops_criterion_and_rebalances() {
    let mut config = two_criteria_category();
    config.criteria[1].missing_strategy = MissingStrategy::IgnoreReweight;
    let weights = resolve_weights(&config, &[]);

    let result = aggregate(&facts(serde_json::json!({ "c1": 8 })), &config, &weights);

    assert_eq!(result.excluded_criteria, vec!["c2".to_string()]);
    assert_eq!(result.breakdown.len(), 1);
    assert_close(result.breakdown[0].weight, 1.0);
    assert_close(result.score, 8.0);
}

#[test]
fn null_attribute_counts_as_missing() {
    let mut config = two_criteria_category();
    config.criteria[1].missing_strategy = MissingStrategy::IgnoreReweight;
    let weights = resolve_weights(&config, &[]);

    let result = aggregate(
        &facts(serde_json::json!({ "c1": 8, "c2": null })),
        &config,
        &weights,
    );

    assert_eq!(result.excluded_criteria, vec!["c2".to_string()]);
}

#[test]
fn fully_excluded_product_scores_at_floor() {
    let mut config = two_criteria_category();
    for criterion in &mut config.criteria {
        criterion.missing_strategy = MissingStrategy::IgnoreReweight;
    }
    let weights = resolve_weights(&config, &[]);

    let result = aggregate(&facts(serde_json::json!({})), &config, &weights);

    assert!(result.breakdown.is_empty());
    assert_eq!(result.score, VETO_PENALTY);
}

#[test]
fn breakdown_weights_sum_to_one_after_reweighting() {
    let engine = vacuum_engine();
    let mut product = flagship();
    product
        .facts
        .insert_path("price", FactValue::Text("call for price".to_string()));
    let sample: Vec<_> = [flagship(), budget(), loud()]
        .into_iter()
        .map(|record| record.facts)
        .collect();
    let weights = engine.resolve_weights(&sample);
    assert_eq!(weights.source, WeightSource::Hybrid);

    let mut partial = budget().facts;
    partial.insert_path("specs.battery", FactValue::Null);
    let result = aggregate(&partial, &engine.profile().category, &weights);

    assert_eq!(result.excluded_criteria, vec!["battery".to_string()]);
    let total: f64 = result.breakdown.iter().map(|entry| entry.weight).sum();
    assert!((total - 1.0).abs() < WEIGHT_SUM_TOLERANCE);

    let unreadable = aggregate(&product.facts, &engine.profile().category, &weights);
    let price = unreadable
        .breakdown
        .iter()
        .find(|entry| entry.criterion_id == "price")
        .expect("price scored");
    assert_eq!(price.normalized_value, VETO_PENALTY);
    assert!(!price.is_vetoed);
}

#[test]
fn strengths_and_weaknesses_are_ranked() {
    let engine = vacuum_engine();
    let weights = engine.resolve_weights(&[]);

    let result = aggregate(&loud().facts, &engine.profile().category, &weights);

    assert_eq!(result.weaknesses[0].criterion_id, "noise");
    assert!(result.weaknesses[0].is_vetoed);
    let strength_floor = STRENGTH_THRESHOLD / result.breakdown.len() as f64;
    assert!(result
        .strengths
        .iter()
        .all(|highlight| !highlight.is_vetoed && highlight.contribution >= strength_floor));
    let contributions: Vec<f64> = result
        .strengths
        .iter()
        .map(|highlight| highlight.contribution)
        .collect();
    assert!(contributions.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[test]
fn lightly_weighted_criteria_are_not_highlighted() {
    let config = category(vec![
        linear_criterion("minor", 0.01, 0.0, 10.0),
        linear_criterion("major", 0.99, 0.0, 10.0),
    ]);
    let weights = resolve_weights(&config, &[]);

    let strong_minor = aggregate(
        &facts(serde_json::json!({ "minor": 9, "major": 3 })),
        &config,
        &weights,
    );
    assert!(strong_minor.strengths.is_empty());
    assert_eq!(strong_minor.weaknesses.len(), 1);
    assert_eq!(strong_minor.weaknesses[0].criterion_id, "minor");

    let strong_major = aggregate(
        &facts(serde_json::json!({ "minor": 9, "major": 8 })),
        &config,
        &weights,
    );
    let ids: Vec<&str> = strong_major
        .strengths
        .iter()
        .map(|highlight| highlight.criterion_id.as_str())
        .collect();
    assert_eq!(ids, vec!["major"]);
}

#[test]
fn equal_weights_highlight_by_normalized_value() {
    let config = category(vec![
        linear_criterion("a", 1.0, 0.0, 10.0),
        linear_criterion("b", 1.0, 0.0, 10.0),
        linear_criterion("c", 1.0, 0.0, 10.0),
    ]);
    let weights = resolve_weights(&config, &[]);

    let result = aggregate(
        &facts(serde_json::json!({ "a": 8, "b": 5, "c": 3 })),
        &config,
        &weights,
    );

    assert_eq!(result.strengths.len(), 1);
    assert_eq!(result.strengths[0].criterion_id, "a");
    assert_eq!(result.weaknesses.len(), 1);
    assert_eq!(result.weaknesses[0].criterion_id, "c");
}

#[test]
fn utility_of_empty_breakdown_is_floor() {
    assert_eq!(utility_score(&[], 0.05), 0.05);
}
