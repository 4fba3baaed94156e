use super::fields::{Choice, FieldSpec, NumberBounds};
use super::{HyperparameterConfig, HyperparameterValues, Render};

use serde_json::json;

pub const ID: &str = "xgboost";

const STRATEGY: &str = "Training strategy";
const TREE: &str = "Learning rate & tree constraints";
const SAMPLING: &str = "Sampling & column usage";
const REGULARIZATION: &str = "Regularization & process settings";
const DART: &str = "DART & advanced controls";
const OBJECTIVE: &str = "Objective & evaluation";

const BOOSTERS: &[Choice] = &[
    Choice::Str("gbtree", "Tree booster (gbtree)"),
    Choice::Str("gblinear", "Linear booster (gblinear)"),
    Choice::Str("dart", "Dropout trees (dart)"),
];

const VERBOSITY: &[Choice] = &[
    Choice::Int(0, "0 – Silent"),
    Choice::Int(1, "1 – Warning"),
    Choice::Int(2, "2 – Info"),
    Choice::Int(3, "3 – Debug"),
];

const CSV_WEIGHTS: &[Choice] = &[
    Choice::Int(0, "0 – Ignore CSV weights"),
    Choice::Int(1, "1 – Use last column as weights"),
];

const SAMPLING_METHODS: &[Choice] = &[
    Choice::Str("uniform", "Uniform sampling"),
    Choice::Str("gradient_based", "Gradient-based sampling"),
];

const TREE_METHODS: &[Choice] = &[
    Choice::Str("auto", "Auto"),
    Choice::Str("exact", "Exact"),
    Choice::Str("approx", "Approximate"),
    Choice::Str("hist", "Histogram"),
];

const DSPLIT: &[Choice] = &[Choice::Str("row", "Row"), Choice::Str("col", "Column")];

const REFRESH_LEAF: &[Choice] = &[
    Choice::Int(0, "0 – Keep leaf values"),
    Choice::Int(1, "1 – Refresh leaf values"),
];

const PROCESS_TYPES: &[Choice] = &[
    Choice::Str("default", "Default"),
    Choice::Str("update", "Update"),
];

const GROW_POLICIES: &[Choice] = &[
    Choice::Str("depthwise", "Depth-wise"),
    Choice::Str("lossguide", "Loss-guide"),
];

const SAMPLE_TYPES: &[Choice] = &[
    Choice::Str("uniform", "Uniform"),
    Choice::Str("weighted", "Weighted"),
];

const NORMALIZE_TYPES: &[Choice] = &[Choice::Str("tree", "Tree"), Choice::Str("forest", "Forest")];

const ONE_DROP: &[Choice] = &[
    Choice::Int(0, "0 – Disabled"),
    Choice::Int(1, "1 – Always drop one tree"),
];

const OBJECTIVES: &[Choice] = &[
    Choice::Str("reg:squarederror", "reg:squarederror – L2 regression"),
    Choice::Str("reg:squaredlogerror", "reg:squaredlogerror"),
    Choice::Str("reg:logistic", "reg:logistic – Logistic regression"),
    Choice::Str("reg:pseudohubererror", "reg:pseudohubererror"),
    Choice::Str("reg:absoluteerror", "reg:absoluteerror – L1 regression"),
    Choice::Str("reg:quantileerror", "reg:quantileerror"),
    Choice::Str("binary:logistic", "binary:logistic"),
    Choice::Str("binary:logitraw", "binary:logitraw"),
    Choice::Str("binary:hinge", "binary:hinge"),
    Choice::Str("count:poisson", "count:poisson"),
    Choice::Str("survival:cox", "survival:cox"),
    Choice::Str("survival:aft", "survival:aft"),
    Choice::Str("multi:softmax", "multi:softmax"),
    Choice::Str("multi:softprob", "multi:softprob"),
    Choice::Str("rank:ndcg", "rank:ndcg"),
    Choice::Str("rank:map", "rank:map"),
    Choice::Str("rank:pairwise", "rank:pairwise"),
    Choice::Str("reg:gamma", "reg:gamma"),
    Choice::Str("reg:tweedie", "reg:tweedie"),
];

const EVAL_METRICS: &[&str] = &[
    "rmse",
    "rmsle",
    "mae",
    "mape",
    "mphe",
    "logloss",
    "error",
    "error@t",
    "merror",
    "mlogloss",
    "auc",
    "aucpr",
    "pre",
    "ndcg",
    "map",
    "poisson-nloglik",
    "gamma-nloglik",
    "cox-nloglik",
    "gamma-deviance",
    "tweedie-nloglik",
    "aft-nloglik",
    "interval-regression-accuracy",
];

const NON_NEGATIVE: NumberBounds = NumberBounds::any().min(0.0);
const FRACTION: NumberBounds = NumberBounds::any().range(0.0, 1.0);
const COLUMN_FRACTION: NumberBounds = NumberBounds::any().range(0.1, 1.0);

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::number(STRATEGY, "num_round", "Boosting rounds (num_round)", NumberBounds::any().min(1.0).integer()),
    FieldSpec::number(
        STRATEGY,
        "early_stopping_rounds",
        "Early stopping rounds",
        NumberBounds::any().min(0.0).integer().nullable(),
    ),
    FieldSpec::choice(STRATEGY, "booster", "Booster", BOOSTERS),
    FieldSpec::choice(STRATEGY, "verbosity", "Verbosity", VERBOSITY),
    FieldSpec::choice(STRATEGY, "csv_weights", "CSV sample weights", CSV_WEIGHTS),
    FieldSpec::auto_or_count(STRATEGY, "nthread", "CPU threads (nthread)", 1.0, 4.0),
    FieldSpec::number(STRATEGY, "base_score", "Base score", NumberBounds::any().range(-10.0, 10.0)),
    FieldSpec::number(STRATEGY, "scale_pos_weight", "Scale positive weight", NON_NEGATIVE),
    FieldSpec::number(TREE, "eta", "Learning rate (eta)", FRACTION),
    FieldSpec::number(TREE, "gamma", "Min split loss (gamma)", NON_NEGATIVE),
    FieldSpec::number(TREE, "max_depth", "Max depth", NumberBounds::any().range(0.0, 1024.0).integer()),
    FieldSpec::number(TREE, "min_child_weight", "Min child weight", NON_NEGATIVE),
    FieldSpec::number(TREE, "max_delta_step", "Max delta step", NON_NEGATIVE),
    FieldSpec::number(SAMPLING, "subsample", "Subsample", COLUMN_FRACTION),
    FieldSpec::choice(SAMPLING, "sampling_method", "Sampling method", SAMPLING_METHODS),
    FieldSpec::number(SAMPLING, "colsample_bytree", "Colsample by tree", COLUMN_FRACTION),
    FieldSpec::number(SAMPLING, "colsample_bylevel", "Colsample by level", COLUMN_FRACTION),
    FieldSpec::number(SAMPLING, "colsample_bynode", "Colsample by node", COLUMN_FRACTION),
    FieldSpec::number(SAMPLING, "sketch_eps", "Sketch epsilon", NON_NEGATIVE),
    FieldSpec::number(REGULARIZATION, "lambda", "Lambda (L2)", NON_NEGATIVE),
    FieldSpec::number(REGULARIZATION, "alpha", "Alpha (L1)", NON_NEGATIVE),
    FieldSpec::number(REGULARIZATION, "lambda_bias", "Lambda bias", NON_NEGATIVE),
    FieldSpec::choice(REGULARIZATION, "tree_method", "Tree method", TREE_METHODS),
    FieldSpec::choice(REGULARIZATION, "updater", "Updater sequence", TREE_METHODS),
    FieldSpec::choice(REGULARIZATION, "dsplit", "Data split (dsplit)", DSPLIT),
    FieldSpec::choice(REGULARIZATION, "refresh_leaf", "Refresh leaf stats", REFRESH_LEAF),
    FieldSpec::choice(REGULARIZATION, "process_type", "Process type", PROCESS_TYPES),
    FieldSpec::choice(REGULARIZATION, "grow_policy", "Grow policy", GROW_POLICIES),
    FieldSpec::number(REGULARIZATION, "max_leaves", "Max leaves", NumberBounds::any().min(0.0).integer()),
    FieldSpec::number(REGULARIZATION, "max_bin", "Max bin", NumberBounds::any().min(2.0).integer()),
    FieldSpec::number(REGULARIZATION, "num_parallel_tree", "Num parallel tree", NumberBounds::any().min(1.0).integer()),
    FieldSpec::choice(DART, "sample_type", "Sample type", SAMPLE_TYPES),
    FieldSpec::choice(DART, "normalize_type", "Normalize type", NORMALIZE_TYPES),
    FieldSpec::number(DART, "rate_drop", "Rate drop", FRACTION),
    FieldSpec::choice(DART, "one_drop", "One drop", ONE_DROP),
    FieldSpec::number(DART, "skip_drop", "Skip drop", FRACTION),
    FieldSpec::number(DART, "tweedie_variance_power", "Tweedie variance power", NumberBounds::any().range(1.01, 1.99)),
    FieldSpec::choice(OBJECTIVE, "objective", "Objective", OBJECTIVES),
    FieldSpec::multi(OBJECTIVE, "eval_metric", "Evaluation metrics", EVAL_METRICS),
];

fn default_values() -> HyperparameterValues {
    let defaults = json!({
        "early_stopping_rounds": null,
        "csv_weights": 0,
        "num_round": 300,
        "booster": "gbtree",
        "verbosity": 1,
        "nthread": "auto",
        "eta": 0.3,
        "gamma": 0,
        "max_depth": 6,
        "min_child_weight": 1,
        "max_delta_step": 0,
        "subsample": 1,
        "sampling_method": "uniform",
        "colsample_bytree": 1,
        "colsample_bylevel": 1,
        "colsample_bynode": 1,
        "lambda": 1,
        "alpha": 0,
        "tree_method": "auto",
        "sketch_eps": 0.03,
        "scale_pos_weight": 1,
        "updater": "auto",
        "dsplit": "row",
        "refresh_leaf": 1,
        "process_type": "default",
        "grow_policy": "depthwise",
        "max_leaves": 0,
        "max_bin": 256,
        "num_parallel_tree": 1,
        "sample_type": "uniform",
        "normalize_type": "tree",
        "rate_drop": 0,
        "one_drop": 0,
        "skip_drop": 0,
        "lambda_bias": 0,
        "tweedie_variance_power": 1.5,
        "objective": "reg:squarederror",
        "base_score": 0.5,
        "eval_metric": ["rmse"],
    });

    match defaults {
        serde_json::Value::Object(map) => map,
        _ => HyperparameterValues::new(),
    }
}

pub fn config() -> HyperparameterConfig {
    HyperparameterConfig {
        id: ID.to_string(),
        label: "XGBoost".to_string(),
        default_values: default_values(),
        render: Render::Fields(FIELDS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_has_a_default_and_vice_versa() {
        let defaults = default_values();
        assert_eq!(FIELDS.len(), defaults.len());
        for field in FIELDS {
            assert!(defaults.contains_key(field.key), "missing default for {}", field.key);
        }
    }

    #[test]
    fn early_stopping_defaults_to_explicit_null() {
        let defaults = default_values();
        assert_eq!(defaults.get("early_stopping_rounds"), Some(&serde_json::Value::Null));
    }
}
