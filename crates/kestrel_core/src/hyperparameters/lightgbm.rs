use super::fields::{Choice, FieldSpec, NumberBounds};
use super::{HyperparameterConfig, HyperparameterValues, Render};

use serde_json::json;

pub const ID: &str = "lightgbm";

const CORE: &str = "Core parameters";
const LEARNING: &str = "Learning control";
const OBJECTIVE: &str = "Objective & evaluation";

const BOOSTING: &[Choice] = &[
    Choice::Str("gbdt", "Gradient boosting (gbdt)"),
    Choice::Str("dart", "Dropout trees (dart)"),
    Choice::Str("rf", "Random forest (rf)"),
];

const OBJECTIVES: &[Choice] = &[
    Choice::Str("regression", "regression – L2"),
    Choice::Str("regression_l1", "regression_l1"),
    Choice::Str("huber", "huber"),
    Choice::Str("poisson", "poisson"),
    Choice::Str("binary", "binary"),
    Choice::Str("multiclass", "multiclass"),
    Choice::Str("lambdarank", "lambdarank"),
];

const METRICS: &[&str] = &[
    "l1",
    "l2",
    "rmse",
    "huber",
    "auc",
    "binary_logloss",
    "binary_error",
    "multi_logloss",
    "multi_error",
    "ndcg",
    "map",
];

const NON_NEGATIVE: NumberBounds = NumberBounds::any().min(0.0);

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::choice(CORE, "boosting", "Boosting type", BOOSTING),
    FieldSpec::number(CORE, "num_iterations", "Iterations", NumberBounds::any().min(1.0).integer()),
    FieldSpec::number(CORE, "learning_rate", "Learning rate", NumberBounds::any().range(0.0, 1.0)),
    FieldSpec::number(CORE, "num_leaves", "Max leaves per tree", NumberBounds::any().range(2.0, 131_072.0).integer()),
    FieldSpec::auto_or_count(CORE, "num_threads", "CPU threads", 1.0, 4.0),
    FieldSpec::number(LEARNING, "max_depth", "Max depth (-1 for no limit)", NumberBounds::any().min(-1.0).integer()),
    FieldSpec::number(LEARNING, "min_data_in_leaf", "Min data in leaf", NumberBounds::any().min(0.0).integer()),
    FieldSpec::number(LEARNING, "feature_fraction", "Feature fraction", NumberBounds::any().range(0.1, 1.0)),
    FieldSpec::number(LEARNING, "bagging_fraction", "Bagging fraction", NumberBounds::any().range(0.1, 1.0)),
    FieldSpec::number(LEARNING, "bagging_freq", "Bagging frequency", NumberBounds::any().min(0.0).integer()),
    FieldSpec::number(LEARNING, "lambda_l1", "Lambda L1", NON_NEGATIVE),
    FieldSpec::number(LEARNING, "lambda_l2", "Lambda L2", NON_NEGATIVE),
    FieldSpec::number(
        LEARNING,
        "early_stopping_round",
        "Early stopping rounds",
        NumberBounds::any().min(0.0).integer().nullable(),
    ),
    FieldSpec::choice(OBJECTIVE, "objective", "Objective", OBJECTIVES),
    FieldSpec::multi(OBJECTIVE, "metric", "Metrics", METRICS),
];

fn default_values() -> HyperparameterValues {
    let defaults = json!({
        "boosting": "gbdt",
        "num_iterations": 100,
        "learning_rate": 0.1,
        "num_leaves": 31,
        "num_threads": "auto",
        "max_depth": -1,
        "min_data_in_leaf": 20,
        "feature_fraction": 1,
        "bagging_fraction": 1,
        "bagging_freq": 0,
        "lambda_l1": 0,
        "lambda_l2": 0,
        "early_stopping_round": null,
        "objective": "regression",
        "metric": ["l2"],
    });

    match defaults {
        serde_json::Value::Object(map) => map,
        _ => HyperparameterValues::new(),
    }
}

pub fn config() -> HyperparameterConfig {
    HyperparameterConfig {
        id: ID.to_string(),
        label: "LightGBM".to_string(),
        default_values: default_values(),
        render: Render::Fields(FIELDS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_has_a_default() {
        let defaults = default_values();
        assert_eq!(FIELDS.len(), defaults.len());
        assert!(FIELDS.iter().all(|f| defaults.contains_key(f.key)));
    }
}
