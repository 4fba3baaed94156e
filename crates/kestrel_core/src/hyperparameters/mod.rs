//! Per-algorithm hyperparameter configurations.
//!
//! Each registered algorithm declares typed fields (with their own ranges and
//! options) and a set of defaults. Lookups are by exact id; unknown ids never
//! fail, they resolve to `None` or to an empty placeholder.
//!
//! ```
//! use kestrel_core::hyperparameters;
//!
//! let config = hyperparameters::get("xgboost").unwrap();
//! let values = config.defaults();
//! let values = config.edit_number(&values, "eta", "7");
//! assert_eq!(values["eta"], serde_json::json!(1.0));
//!
//! assert!(hyperparameters::get("nope").is_none());
//! assert!(hyperparameters::defaults("nope").is_empty());
//! ```

pub mod fields;
pub mod lightgbm;
pub mod xgboost;

use fields::{FieldKind, FieldSpec, NumberBounds, clamp_number, number_value, string_list};

use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub type HyperparameterValues = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Algorithm {
    pub id: &'static str,
    pub name: &'static str,
}

/// Built-in algorithms offered when the job uses a built-in image.
pub const BUILTIN_ALGORITHMS: &[Algorithm] = &[
    Algorithm { id: "xgboost", name: "XGBoost" },
    Algorithm { id: "lightgbm", name: "LightGBM" },
    Algorithm { id: "tensorflow-cnn", name: "TensorFlow CNN" },
    Algorithm { id: "tensorflow-transformer", name: "TensorFlow Transformer" },
    Algorithm { id: "tf-distributed", name: "TensorFlow Distributed" },
    Algorithm { id: "horovod-mpi", name: "Horovod (MPI)" },
    Algorithm { id: "deepspeed-zero3", name: "DeepSpeed" },
    Algorithm { id: "jax-pjit", name: "JAX PJIT" },
    Algorithm { id: "torch-mpi", name: "PyTorch MPI" },
];

pub const DEFAULT_ALGORITHM: &str = xgboost::ID;

pub fn display_name(id: &str) -> Option<&'static str> {
    BUILTIN_ALGORITHMS
        .iter()
        .find(|algorithm| algorithm.id == id)
        .map(|algorithm| algorithm.name)
}

/// How a configuration is presented for editing.
#[derive(Debug, Clone, PartialEq)]
pub enum Render {
    /// Editable typed fields, in display order.
    Fields(&'static [FieldSpec]),
    /// No fields yet; shown as a read-only notice.
    Placeholder { notice: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HyperparameterConfig {
    pub id: String,
    pub label: String,
    pub default_values: HyperparameterValues,
    pub render: Render,
}

impl HyperparameterConfig {
    pub fn placeholder(id: impl Into<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            id: id.into(),
            label: label.clone(),
            default_values: HyperparameterValues::new(),
            render: Render::Placeholder {
                notice: format!(
                    "{label} hyperparameters: no inputs are defined yet. This form is read-only."
                ),
            },
        }
    }

    /// A fresh copy of the defaults. Never the shared instance.
    pub fn defaults(&self) -> HyperparameterValues {
        self.default_values.clone()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        match &self.render {
            Render::Fields(fields) => fields,
            Render::Placeholder { .. } => &[],
        }
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields().iter().find(|field| field.key == key)
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.render, Render::Placeholder { .. })
    }

    /// Defaults overlaid with `values`, so every declared field is present.
    pub fn resolve(&self, values: &HyperparameterValues) -> HyperparameterValues {
        let mut merged = self.defaults();
        for (key, value) in values {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    fn fallback_number(&self, values: &HyperparameterValues, key: &str) -> Option<f64> {
        values
            .get(key)
            .and_then(Value::as_f64)
            .or_else(|| self.default_values.get(key).and_then(Value::as_f64))
    }

    /// Applies raw numeric input to a `Number` field through [`clamp_number`].
    pub fn edit_number(&self, values: &HyperparameterValues, key: &str, raw: &str) -> HyperparameterValues {
        let Some(FieldKind::Number(bounds)) = self.field(key).map(|f| f.kind) else {
            return values.clone();
        };

        let next = clamp_number(raw, self.fallback_number(values, key), bounds)
            .map(|v| number_value(v, bounds.integer))
            .unwrap_or(Value::Null);

        let mut out = values.clone();
        out.insert(key.to_string(), next);
        out
    }

    /// Selects one option of a `Choice` field. Undeclared options leave the values unchanged.
    pub fn select(&self, values: &HyperparameterValues, key: &str, raw: &str) -> HyperparameterValues {
        let Some(FieldKind::Choice(options)) = self.field(key).map(|f| f.kind) else {
            return values.clone();
        };

        match options.iter().find(|option| option.raw() == raw) {
            Some(option) => {
                let mut out = values.clone();
                out.insert(key.to_string(), option.to_value());
                out
            }
            None => values.clone(),
        }
    }

    /// Toggles one option of a `MultiSelect` field.
    pub fn toggle(&self, values: &HyperparameterValues, key: &str, option: &str) -> HyperparameterValues {
        let Some(FieldKind::MultiSelect(options)) = self.field(key).map(|f| f.kind) else {
            return values.clone();
        };
        if !options.contains(&option) {
            return values.clone();
        }

        let current = self.current_list(values, key);
        let mut out = values.clone();
        out.insert(key.to_string(), Value::from(fields::toggle(&current, option)));
        out
    }

    /// Replaces a `MultiSelect` field with the declared options in `selected`, first occurrence wins.
    pub fn set_multi<'a>(
        &self,
        values: &HyperparameterValues,
        key: &str,
        selected: impl IntoIterator<Item = &'a str>,
    ) -> HyperparameterValues {
        let Some(FieldKind::MultiSelect(options)) = self.field(key).map(|f| f.kind) else {
            return values.clone();
        };

        let mut next: Vec<String> = Vec::new();
        for item in selected {
            let item = item.trim();
            if options.contains(&item) && !next.iter().any(|existing| existing == item) {
                next.push(item.to_string());
            }
        }

        let mut out = values.clone();
        out.insert(key.to_string(), Value::from(next));
        out
    }

    /// Sets an `AutoOrCount` field to `"auto"` or to a manual count.
    pub fn set_auto_or_count(&self, values: &HyperparameterValues, key: &str, raw: &str) -> HyperparameterValues {
        let Some(FieldKind::AutoOrCount { min, manual_default }) = self.field(key).map(|f| f.kind) else {
            return values.clone();
        };

        let next = if raw.trim().eq_ignore_ascii_case("auto") {
            Value::from("auto")
        } else {
            let previous = values.get(key).and_then(Value::as_f64).unwrap_or(manual_default);
            let bounds = NumberBounds::any().min(min).integer();
            let count = clamp_number(raw, Some(previous), bounds).unwrap_or(previous);
            number_value(count, true)
        };

        let mut out = values.clone();
        out.insert(key.to_string(), next);
        out
    }

    /// Applies raw `key=value` style input to whichever kind of field `key` is.
    ///
    /// Multi-select input is a comma separated list that replaces the selection.
    /// Returns `None` if the config declares no such field.
    pub fn apply(&self, values: &HyperparameterValues, key: &str, raw: &str) -> Option<HyperparameterValues> {
        let field = self.field(key)?;
        Some(match field.kind {
            FieldKind::Number(_) => self.edit_number(values, key, raw),
            FieldKind::Choice(_) => self.select(values, key, raw),
            FieldKind::MultiSelect(_) => self.set_multi(values, key, raw.split(',')),
            FieldKind::AutoOrCount { .. } => self.set_auto_or_count(values, key, raw),
        })
    }

    fn current_list(&self, values: &HyperparameterValues, key: &str) -> Vec<String> {
        if values.contains_key(key) {
            string_list(values, key)
        } else {
            string_list(&self.default_values, key)
        }
    }
}

static REGISTRY: LazyLock<BTreeMap<&'static str, HyperparameterConfig>> = LazyLock::new(|| {
    let mut registry = BTreeMap::new();
    registry.insert(xgboost::ID, xgboost::config());
    registry.insert(lightgbm::ID, lightgbm::config());

    for algorithm in BUILTIN_ALGORITHMS {
        registry
            .entry(algorithm.id)
            .or_insert_with(|| HyperparameterConfig::placeholder(algorithm.id, algorithm.name));
    }
    registry
});

/// Looks up a registered configuration by exact id.
pub fn get(id: &str) -> Option<&'static HyperparameterConfig> {
    REGISTRY.get(id)
}

/// A deep copy of the registered defaults for `id`, or an empty map.
pub fn defaults(id: &str) -> HyperparameterValues {
    get(id).map(HyperparameterConfig::defaults).unwrap_or_default()
}

/// The registered configuration, or a read-only placeholder for unknown ids.
pub fn config_or_placeholder(id: &str) -> Cow<'static, HyperparameterConfig> {
    match get(id) {
        Some(config) => Cow::Borrowed(config),
        None => Cow::Owned(HyperparameterConfig::placeholder(
            id,
            display_name(id).unwrap_or(id),
        )),
    }
}

pub fn registered_ids() -> impl Iterator<Item = &'static str> {
    REGISTRY.keys().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_ids_degrade_gracefully() {
        for id in ["", "XGBoost", "xgboost ", "catboost"] {
            assert!(get(id).is_none());
            assert!(defaults(id).is_empty());
            let placeholder = config_or_placeholder(id);
            assert!(placeholder.is_read_only());
            assert!(placeholder.default_values.is_empty());
        }
    }

    #[test]
    fn every_builtin_algorithm_is_registered() {
        for algorithm in BUILTIN_ALGORITHMS {
            assert!(get(algorithm.id).is_some(), "{} not registered", algorithm.id);
        }
        assert!(get("torch-mpi").unwrap().is_read_only());
        assert!(!get("xgboost").unwrap().is_read_only());
    }

    #[test]
    fn defaults_are_independent_copies() {
        let mut first = defaults("xgboost");
        first.insert("eta".into(), json!(0.9));
        let second = defaults("xgboost");
        assert_eq!(second["eta"], json!(0.3));
        assert_eq!(get("xgboost").unwrap().default_values["eta"], json!(0.3));
    }

    #[test]
    fn edit_number_clamps_and_nulls() {
        let config = get("xgboost").unwrap();
        let values = config.defaults();

        let values = config.edit_number(&values, "max_depth", "2000");
        assert_eq!(values["max_depth"], json!(1024));

        let values = config.edit_number(&values, "subsample", "0.01");
        assert_eq!(values["subsample"], json!(0.1));

        let values = config.edit_number(&values, "num_round", "oops");
        assert_eq!(values["num_round"], json!(300));

        let values = config.edit_number(&values, "early_stopping_rounds", "12.4");
        assert_eq!(values["early_stopping_rounds"], json!(12));
        let values = config.edit_number(&values, "early_stopping_rounds", "");
        assert_eq!(values["early_stopping_rounds"], Value::Null);

        // Not a numeric field.
        let unchanged = config.edit_number(&values, "booster", "3");
        assert_eq!(unchanged, values);
    }

    #[test]
    fn select_only_accepts_declared_options() {
        let config = get("xgboost").unwrap();
        let values = config.defaults();

        let values = config.select(&values, "booster", "dart");
        assert_eq!(values["booster"], json!("dart"));

        let values = config.select(&values, "booster", "catboost");
        assert_eq!(values["booster"], json!("dart"));

        let values = config.select(&values, "verbosity", "3");
        assert_eq!(values["verbosity"], json!(3));
    }

    #[test]
    fn eval_metric_toggles() {
        let config = get("xgboost").unwrap();
        let values = config.defaults();

        let values = config.toggle(&values, "eval_metric", "auc");
        assert_eq!(values["eval_metric"], json!(["rmse", "auc"]));
        let values = config.toggle(&values, "eval_metric", "rmse");
        assert_eq!(values["eval_metric"], json!(["auc"]));
        let values = config.toggle(&values, "eval_metric", "not-a-metric");
        assert_eq!(values["eval_metric"], json!(["auc"]));
    }

    #[test]
    fn nthread_switches_between_auto_and_manual() {
        let config = get("xgboost").unwrap();
        let values = config.defaults();

        let values = config.set_auto_or_count(&values, "nthread", "0");
        assert_eq!(values["nthread"], json!(1));
        let values = config.set_auto_or_count(&values, "nthread", "junk");
        assert_eq!(values["nthread"], json!(1));
        let values = config.set_auto_or_count(&values, "nthread", "AUTO");
        assert_eq!(values["nthread"], json!("auto"));
        let values = config.set_auto_or_count(&values, "nthread", "");
        assert_eq!(values["nthread"], json!(4));
    }

    #[test]
    fn apply_dispatches_by_field_kind() {
        let config = get("xgboost").unwrap();
        let values = config.defaults();

        let values = config.apply(&values, "eta", "0.05").unwrap();
        let values = config.apply(&values, "objective", "binary:logistic").unwrap();
        let values = config.apply(&values, "eval_metric", "auc, logloss,auc,bogus").unwrap();
        assert_eq!(values["eta"], json!(0.05));
        assert_eq!(values["objective"], json!("binary:logistic"));
        assert_eq!(values["eval_metric"], json!(["auc", "logloss"]));

        assert!(config.apply(&values, "unknown", "1").is_none());
    }

    #[test]
    fn resolve_fills_missing_fields() {
        let config = get("lightgbm").unwrap();
        let mut partial = HyperparameterValues::new();
        partial.insert("num_leaves".into(), json!(63));
        let resolved = config.resolve(&partial);
        assert_eq!(resolved["num_leaves"], json!(63));
        assert_eq!(resolved["learning_rate"], json!(0.1));
        assert_eq!(resolved.len(), config.default_values.len());
    }
}
