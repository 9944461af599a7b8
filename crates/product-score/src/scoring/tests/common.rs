use std::collections::BTreeMap;
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::scoring::{
    CategoryConfig, CategoryProfile, CategoryRegistry, Context, CriterionConfig, DeltaRule,
    Direction, FactValue, FatalCondition, FatalRule, MissingStrategy, Normalization,
    ProductFacts, ProductRecord, ScoringEngine, ScoringService,
};

pub(super) const VETO_PENALTY: f64 = 0.01;

pub(super) fn linear_criterion(id: &str, weight: f64, min: f64, max: f64) -> CriterionConfig {
    CriterionConfig {
        id: id.to_string(),
        label: id.to_string(),
        data_field: id.to_string(),
        weight_subjective: weight,
        direction: Direction::Maximize,
        missing_strategy: MissingStrategy::ImputePenalty,
        impute_value: FactValue::Number(min),
        veto_threshold: None,
        normalization: Normalization::Linear { min, max },
    }
}

pub(super) fn category(criteria: Vec<CriterionConfig>) -> CategoryConfig {
    CategoryConfig {
        category_id: "test".to_string(),
        hybrid_alpha: 0.5,
        veto_penalty: VETO_PENALTY,
        criteria,
    }
}

/// Two linear 0-10 criteria weighted 0.6 / 0.4; the second vetoes below 3.
pub(super) fn two_criteria_category() -> CategoryConfig {
    let mut c2 = linear_criterion("c2", 0.4, 0.0, 10.0);
    c2.veto_threshold = Some(3.0);
    category(vec![linear_criterion("c1", 0.6, 0.0, 10.0), c2])
}

pub(super) fn facts(value: Value) -> ProductFacts {
    serde_json::from_value(value).expect("facts deserialize")
}

pub(super) fn context(id: &str, groups: &[&str]) -> Context {
    Context {
        id: id.to_string(),
        name: id.replace('_', " "),
        exclusion_groups: groups.iter().map(|group| group.to_string()).collect(),
        weight: 1.0,
        deltas: Vec::new(),
        fatal: None,
    }
}

pub(super) fn delta(criterion_id: &str, weight_multiplier: f64, value_shift: f64) -> DeltaRule {
    DeltaRule {
        criterion_id: criterion_id.to_string(),
        weight_multiplier,
        value_shift,
        regions: Vec::new(),
    }
}

pub(super) fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Robot vacuum category used by the engine, service, and routing tests.
pub(super) fn vacuum_profile() -> CategoryProfile {
    let suction = CriterionConfig {
        id: "suction".to_string(),
        label: "Suction power".to_string(),
        data_field: "specs.suction_pa".to_string(),
        weight_subjective: 0.3,
        direction: Direction::Maximize,
        missing_strategy: MissingStrategy::ImputePenalty,
        impute_value: FactValue::Number(0.0),
        veto_threshold: Some(1000.0),
        normalization: Normalization::Sigmoid {
            k: 0.002,
            x0: 2500.0,
        },
    };
    let noise = CriterionConfig {
        id: "noise".to_string(),
        label: "Noise level".to_string(),
        data_field: "specs.noise_db".to_string(),
        weight_subjective: 0.2,
        direction: Direction::Minimize,
        missing_strategy: MissingStrategy::ImputePenalty,
        impute_value: FactValue::Number(75.0),
        veto_threshold: Some(72.0),
        normalization: Normalization::Linear {
            min: 50.0,
            max: 75.0,
        },
    };
    let battery = CriterionConfig {
        id: "battery".to_string(),
        label: "Battery runtime".to_string(),
        data_field: "specs.battery.runtime_min".to_string(),
        weight_subjective: 0.2,
        direction: Direction::Maximize,
        missing_strategy: MissingStrategy::IgnoreReweight,
        impute_value: FactValue::Null,
        veto_threshold: None,
        normalization: Normalization::Linear {
            min: 30.0,
            max: 180.0,
        },
    };
    let price = CriterionConfig {
        id: "price".to_string(),
        label: "Price".to_string(),
        data_field: "price".to_string(),
        weight_subjective: 0.2,
        direction: Direction::Minimize,
        missing_strategy: MissingStrategy::IgnoreReweight,
        impute_value: FactValue::Null,
        veto_threshold: None,
        normalization: Normalization::Linear {
            min: 150.0,
            max: 1200.0,
        },
    };
    let mop = CriterionConfig {
        id: "mop".to_string(),
        label: "Mopping".to_string(),
        data_field: "specs.mop".to_string(),
        weight_subjective: 0.05,
        direction: Direction::Maximize,
        missing_strategy: MissingStrategy::ImputePenalty,
        impute_value: FactValue::Bool(false),
        veto_threshold: None,
        normalization: Normalization::Boolean {
            true_value: 10.0,
            false_value: 5.0,
        },
    };
    let energy = CriterionConfig {
        id: "energy".to_string(),
        label: "Energy class".to_string(),
        data_field: "energy_class".to_string(),
        weight_subjective: 0.05,
        direction: Direction::Maximize,
        missing_strategy: MissingStrategy::ImputePenalty,
        impute_value: FactValue::Text("C".to_string()),
        veto_threshold: None,
        normalization: Normalization::Ordinal {
            scores: BTreeMap::from([
                ("A".to_string(), 10.0),
                ("B".to_string(), 7.0),
                ("C".to_string(), 4.0),
            ]),
        },
    };

    let mut apartment = context("apartment", &["home_size"]);
    apartment.deltas = vec![delta("noise", 2.0, 0.0), delta("battery", 0.5, 0.0)];

    let mut large_house = context("large_house", &["home_size"]);
    large_house.deltas = vec![delta("battery", 2.0, 0.0)];
    large_house.fatal = Some(FatalRule {
        criterion_id: "battery".to_string(),
        condition: FatalCondition::Below(60.0),
        reason: "runtime too short for a large house".to_string(),
    });

    let mut pets = context("pets", &[]);
    pets.deltas = vec![delta("suction", 1.5, 0.0)];
    let mut us_pricing = delta("price", 1.0, 1.0);
    us_pricing.regions = vec!["us".to_string()];
    pets.deltas.push(us_pricing);

    let mut nursery = context("nursery", &[]);
    nursery.fatal = Some(FatalRule {
        criterion_id: "noise".to_string(),
        condition: FatalCondition::Above(65.0),
        reason: "too loud for a nursery".to_string(),
    });

    CategoryProfile {
        category: CategoryConfig {
            category_id: "robot_vacuum".to_string(),
            hybrid_alpha: 0.4,
            veto_penalty: VETO_PENALTY,
            criteria: vec![suction, noise, battery, price, mop, energy],
        },
        contexts: vec![apartment, large_house, pets, nursery],
    }
}

pub(super) fn vacuum_engine() -> ScoringEngine {
    ScoringEngine::new(Arc::new(vacuum_profile()))
}

pub(super) fn vacuum_service() -> ScoringService {
    let registry = CategoryRegistry::from_profiles(vec![vacuum_profile()]).expect("valid profile");
    ScoringService::new(registry)
}

pub(super) fn flagship() -> ProductRecord {
    ProductRecord {
        product_id: "flagship".to_string(),
        facts: facts(serde_json::json!({
            "price": 899,
            "energy_class": "A",
            "specs": {
                "suction_pa": 5000,
                "noise_db": 58,
                "mop": true,
                "battery": { "runtime_min": 170 }
            }
        })),
    }
}

pub(super) fn budget() -> ProductRecord {
    ProductRecord {
        product_id: "budget".to_string(),
        facts: facts(serde_json::json!({
            "price": 199,
            "energy_class": "b",
            "specs": {
                "suction_pa": 2200,
                "noise_db": 68,
                "mop": false,
                "battery": { "runtime_min": 50 }
            }
        })),
    }
}

/// Loud enough to trip the noise veto.
pub(super) fn loud() -> ProductRecord {
    ProductRecord {
        product_id: "loud".to_string(),
        facts: facts(serde_json::json!({
            "price": 450,
            "energy_class": "B",
            "specs": {
                "suction_pa": 4000,
                "noise_db": 74,
                "mop": true,
                "battery": { "runtime_min": 120 }
            }
        })),
    }
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
