//! Typed field specs and the shared edit helpers every algorithm goes through.

use super::HyperparameterValues;

use serde_json::{Number, Value};

/// Range and shape of a numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberBounds {
    pub min: f64,
    pub max: f64,
    /// Empty input stores an explicit `null` instead of keeping the previous value.
    pub allow_null: bool,
    /// Round to the nearest integer after clamping.
    pub integer: bool,
}

impl NumberBounds {
    pub const fn any() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            allow_null: false,
            integer: false,
        }
    }

    pub const fn min(mut self, min: f64) -> Self {
        self.min = min;
        self
    }

    pub const fn max(mut self, max: f64) -> Self {
        self.max = max;
        self
    }

    pub const fn range(self, min: f64, max: f64) -> Self {
        self.min(min).max(max)
    }

    pub const fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    pub const fn nullable(mut self) -> Self {
        self.allow_null = true;
        self
    }
}

impl Default for NumberBounds {
    fn default() -> Self {
        Self::any()
    }
}

/// Turns raw numeric input into the value to store.
///
/// * empty input: `None` for nullable fields, otherwise `fallback`
/// * input that does not parse to a finite number: `fallback`
/// * anything else: clamped into `[min, max]`, rounded if the field is an integer
///
/// The result is therefore always a finite in-range number or an explicit null.
pub fn clamp_number(raw: &str, fallback: Option<f64>, bounds: NumberBounds) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return if bounds.allow_null { None } else { fallback };
    }

    let parsed = match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => return fallback,
    };

    let clamped = parsed.max(bounds.min).min(bounds.max);
    Some(if bounds.integer {
        clamped.round()
    } else {
        clamped
    })
}

/// A single option of an enumerated field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Choice {
    Str(&'static str, &'static str),
    Int(i64, &'static str),
}

impl Choice {
    pub fn label(&self) -> &'static str {
        match self {
            Choice::Str(_, label) | Choice::Int(_, label) => *label,
        }
    }

    /// The option as typed on a command line or sent by a select widget.
    pub fn raw(&self) -> String {
        match self {
            Choice::Str(v, _) => (*v).to_string(),
            Choice::Int(v, _) => v.to_string(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Choice::Str(v, _) => Value::from(*v),
            Choice::Int(v, _) => Value::from(*v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Number(NumberBounds),
    Choice(&'static [Choice]),
    /// Ordered set of string options with toggle semantics.
    MultiSelect(&'static [&'static str]),
    /// Either the literal `"auto"` or a manual integer count of at least `min`.
    AutoOrCount { min: f64, manual_default: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub section: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn number(
        section: &'static str,
        key: &'static str,
        label: &'static str,
        bounds: NumberBounds,
    ) -> Self {
        Self {
            key,
            label,
            section,
            kind: FieldKind::Number(bounds),
        }
    }

    pub const fn choice(
        section: &'static str,
        key: &'static str,
        label: &'static str,
        options: &'static [Choice],
    ) -> Self {
        Self {
            key,
            label,
            section,
            kind: FieldKind::Choice(options),
        }
    }

    pub const fn multi(
        section: &'static str,
        key: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            label,
            section,
            kind: FieldKind::MultiSelect(options),
        }
    }

    pub const fn auto_or_count(
        section: &'static str,
        key: &'static str,
        label: &'static str,
        min: f64,
        manual_default: f64,
    ) -> Self {
        Self {
            key,
            label,
            section,
            kind: FieldKind::AutoOrCount {
                min,
                manual_default,
            },
        }
    }
}

pub(crate) fn number_value(v: f64, integer: bool) -> Value {
    if integer {
        Value::from(v as i64)
    } else {
        Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Toggles `option` in an ordered set: present values are removed, absent ones appended.
pub fn toggle(current: &[String], option: &str) -> Vec<String> {
    if current.iter().any(|item| item == option) {
        current.iter().filter(|item| *item != option).cloned().collect()
    } else {
        let mut next = current.to_vec();
        next.push(option.to_string());
        next
    }
}

pub(crate) fn string_list(values: &HyperparameterValues, key: &str) -> Vec<String> {
    values
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_falls_back_or_nulls() {
        let bounds = NumberBounds::any().min(0.0).integer();
        assert_eq!(clamp_number("", Some(3.0), bounds), Some(3.0));
        assert_eq!(clamp_number("   ", Some(3.0), bounds.nullable()), None);
    }

    #[test]
    fn garbage_keeps_previous_value() {
        let bounds = NumberBounds::any();
        assert_eq!(clamp_number("abc", Some(0.3), bounds), Some(0.3));
        assert_eq!(clamp_number("NaN", Some(0.3), bounds), Some(0.3));
        assert_eq!(clamp_number("inf", Some(0.3), bounds), Some(0.3));
        assert_eq!(clamp_number("abc", None, bounds.nullable()), None);
    }

    #[test]
    fn clamps_and_rounds() {
        let eta = NumberBounds::any().range(0.0, 1.0);
        assert_eq!(clamp_number("1.7", Some(0.3), eta), Some(1.0));
        assert_eq!(clamp_number("-2", Some(0.3), eta), Some(0.0));
        assert_eq!(clamp_number(" 0.25 ", Some(0.3), eta), Some(0.25));

        let depth = NumberBounds::any().range(0.0, 1024.0).integer();
        assert_eq!(clamp_number("6.6", Some(6.0), depth), Some(7.0));
        assert_eq!(clamp_number("5000", Some(6.0), depth), Some(1024.0));
    }

    #[test]
    fn toggle_preserves_first_insertion_order() {
        let start = vec!["rmse".to_string()];
        let added = toggle(&start, "auc");
        assert_eq!(added, vec!["rmse", "auc"]);
        let added = toggle(&added, "mae");
        assert_eq!(added, vec!["rmse", "auc", "mae"]);
        let removed = toggle(&added, "auc");
        assert_eq!(removed, vec!["rmse", "mae"]);
        let readded = toggle(&removed, "auc");
        assert_eq!(readded, vec!["rmse", "mae", "auc"]);
    }

    #[test]
    fn integer_values_serialize_without_fraction() {
        assert_eq!(number_value(300.0, true), serde_json::json!(300));
        assert_eq!(number_value(0.3, false), serde_json::json!(0.3));
    }
}
