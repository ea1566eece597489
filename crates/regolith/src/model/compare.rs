//! Comparator registry: maps a column's declared type to a comparison rule.
//!
//! The registry holds no per-view state beyond the rule table. Rules are pure
//! functions of two cell values.
//!
//! # Ordering conventions
//!
//! - `Null` sorts before any non-null value of the same column.
//! - Numbers compare by value using IEEE 754 total ordering, so `-0.0 < 0.0`
//!   and NaN sorts after every other number.
//! - Text compares case-sensitively unless the registry was built with
//!   case-insensitive text.
//! - Booleans follow [`BooleanOrder`]. The default puts `true` *before*
//!   `false`, which is the established convention of the product's table
//!   headers and is kept as-is.
//! - Cells whose variant does not match the column type sort after every
//!   matching cell and compare among themselves by their textual
//!   representation. Each rule stays a total order on mixed columns.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::value::{TypeTag, Value};
use crate::config::ViewConfig;
use crate::error::SortError;

/// Type alias for a comparison rule between two non-null cell values.
pub type CompareFn = Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>;

/// Relative order of `true` and `false` in an ascending sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOrder {
    /// `true` sorts before `false`.
    #[default]
    TrueFirst,
    /// `false` sorts before `true`.
    FalseFirst,
}

/// Maps column type tags to comparison rules.
#[derive(Clone)]
pub struct ComparatorRegistry {
    rules: HashMap<TypeTag, CompareFn>,
}

impl Default for ComparatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComparatorRegistry {
    /// Creates a registry with the default rules: case-sensitive text and
    /// `true`-first booleans. `Geometry` has no rule.
    pub fn new() -> Self {
        Self::with_options(true, BooleanOrder::default())
    }

    /// Creates a registry configured from a [`ViewConfig`].
    pub fn from_config(config: &ViewConfig) -> Self {
        Self::with_options(config.case_sensitive, config.boolean_order)
    }

    fn with_options(case_sensitive: bool, boolean_order: BooleanOrder) -> Self {
        let text = if case_sensitive {
            typed_first(TypeTag::Text, compare_text)
        } else {
            typed_first(TypeTag::Text, compare_text_folded)
        };

        let mut rules: HashMap<TypeTag, CompareFn> = HashMap::new();
        rules.insert(TypeTag::Number, typed_first(TypeTag::Number, compare_numbers));
        rules.insert(TypeTag::Text, text);
        rules.insert(
            TypeTag::Boolean,
            typed_first(TypeTag::Boolean, move |a, b| {
                compare_booleans(a, b, boolean_order)
            }),
        );
        rules.insert(TypeTag::Temporal, typed_first(TypeTag::Temporal, compare_temporal));
        rules.insert(TypeTag::Other, typed_first(TypeTag::Other, compare_textual));
        Self { rules }
    }

    /// Registers (or replaces) the rule for a type tag.
    pub fn register<F>(&mut self, type_tag: TypeTag, compare: F)
    where
        F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    {
        self.rules.insert(type_tag, Arc::new(compare));
    }

    /// Removes the rule for a type tag, making columns of that type unsortable.
    pub fn unregister(&mut self, type_tag: TypeTag) -> bool {
        self.rules.remove(&type_tag).is_some()
    }

    /// Returns `true` if a rule is registered for the type tag.
    pub fn supports(&self, type_tag: TypeTag) -> bool {
        self.rules.contains_key(&type_tag)
    }

    /// Looks up the rule for a column, rejecting unsupported types.
    pub fn resolve(&self, column: usize, type_tag: TypeTag) -> Result<CompareFn, SortError> {
        self.rules
            .get(&type_tag)
            .cloned()
            .ok_or(SortError::UnsupportedColumnType { column, type_tag })
    }

    /// Compares two cells of a column of the given type, nulls first.
    ///
    /// Returns `None` if the type has no registered rule.
    pub fn compare(&self, type_tag: TypeTag, a: &Value, b: &Value) -> Option<Ordering> {
        let rule = self.rules.get(&type_tag)?;
        Some(compare_with_nulls(rule.as_ref(), a, b))
    }
}

impl std::fmt::Debug for ComparatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparatorRegistry")
            .field("types", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Applies the null-first convention around a rule.
pub fn compare_with_nulls(
    rule: &(dyn Fn(&Value, &Value) -> Ordering + Send + Sync),
    a: &Value,
    b: &Value,
) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => rule(a, b),
    }
}

/// Wraps a rule for cells of `type_tag` so that mismatched cells rank after
/// them as one textually ordered class.
fn typed_first<F>(type_tag: TypeTag, typed: F) -> CompareFn
where
    F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
{
    Arc::new(move |a: &Value, b: &Value| {
        let fits = |value: &Value| value.natural_type() == Some(type_tag);
        match (fits(a), fits(b)) {
            (true, true) => typed(a, b),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => compare_textual(a, b),
        }
    })
}

fn compare_numbers(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        _ => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => compare_textual(a, b),
        },
    }
}

fn compare_text(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        _ => compare_textual(a, b),
    }
}

fn compare_text_folded(a: &Value, b: &Value) -> Ordering {
    let x = a.to_string();
    let y = b.to_string();
    x.to_lowercase()
        .cmp(&y.to_lowercase())
        .then_with(|| x.cmp(&y))
}

fn compare_booleans(a: &Value, b: &Value, order: BooleanOrder) -> Ordering {
    match (a.as_bool(), b.as_bool()) {
        (Some(x), Some(y)) => match order {
            // `false < true` for `bool`, so true-first is the reverse.
            BooleanOrder::TrueFirst => y.cmp(&x),
            BooleanOrder::FalseFirst => x.cmp(&y),
        },
        _ => compare_textual(a, b),
    }
}

fn compare_temporal(a: &Value, b: &Value) -> Ordering {
    match (a.as_temporal(), b.as_temporal()) {
        (Some(x), Some(y)) => x.cmp(y),
        _ => compare_textual(a, b),
    }
}

fn compare_textual(a: &Value, b: &Value) -> Ordering {
    a.to_string().cmp(&b.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn cmp(registry: &ComparatorRegistry, tag: TypeTag, a: Value, b: Value) -> Ordering {
        registry.compare(tag, &a, &b).unwrap()
    }

    #[test]
    fn test_numbers() {
        let registry = ComparatorRegistry::new();
        assert_eq!(cmp(&registry, TypeTag::Number, 2i64.into(), 10i64.into()), Ordering::Less);
        assert_eq!(cmp(&registry, TypeTag::Number, 2.5.into(), 2i64.into()), Ordering::Greater);
        assert_eq!(
            cmp(&registry, TypeTag::Number, (-0.0).into(), 0.0.into()),
            Ordering::Less
        );
        assert_eq!(
            cmp(&registry, TypeTag::Number, f64::NAN.into(), f64::INFINITY.into()),
            Ordering::Greater
        );
    }

    #[test]
    fn test_text_case_sensitivity() {
        let registry = ComparatorRegistry::new();
        // Uppercase sorts before lowercase in a byte-wise comparison.
        assert_eq!(cmp(&registry, TypeTag::Text, "b".into(), "B".into()), Ordering::Greater);

        let folded = ComparatorRegistry::from_config(&ViewConfig {
            case_sensitive: false,
            ..ViewConfig::default()
        });
        assert_eq!(cmp(&folded, TypeTag::Text, "b".into(), "C".into()), Ordering::Less);
        assert_eq!(cmp(&folded, TypeTag::Text, "B".into(), "b".into()), Ordering::Less);
    }

    #[test]
    fn test_booleans_true_first_by_default() {
        let registry = ComparatorRegistry::new();
        assert_eq!(
            cmp(&registry, TypeTag::Boolean, true.into(), false.into()),
            Ordering::Less
        );

        let false_first = ComparatorRegistry::from_config(&ViewConfig {
            boolean_order: BooleanOrder::FalseFirst,
            ..ViewConfig::default()
        });
        assert_eq!(
            cmp(&false_first, TypeTag::Boolean, true.into(), false.into()),
            Ordering::Greater
        );
    }

    #[test]
    fn test_temporal() {
        let registry = ComparatorRegistry::new();
        let early = Utc.with_ymd_and_hms(2003, 6, 10, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2011, 7, 16, 0, 0, 0).unwrap();
        assert_eq!(
            cmp(&registry, TypeTag::Temporal, early.into(), late.into()),
            Ordering::Less
        );
    }

    #[test]
    fn test_nulls_first() {
        let registry = ComparatorRegistry::new();
        assert_eq!(cmp(&registry, TypeTag::Number, Value::Null, (-5i64).into()), Ordering::Less);
        assert_eq!(cmp(&registry, TypeTag::Text, "a".into(), Value::Null), Ordering::Greater);
        assert_eq!(cmp(&registry, TypeTag::Boolean, Value::Null, Value::Null), Ordering::Equal);
    }

    #[test]
    fn test_other_compares_textually() {
        let registry = ComparatorRegistry::new();
        assert_eq!(
            cmp(&registry, TypeTag::Other, Value::Other("b".into()), Value::Other("a".into())),
            Ordering::Greater
        );
    }

    #[test]
    fn test_mismatched_cells_sort_after_typed_values() {
        let registry = ComparatorRegistry::new();
        assert_eq!(cmp(&registry, TypeTag::Number, "10".into(), 9i64.into()), Ordering::Greater);
        assert_eq!(cmp(&registry, TypeTag::Number, "10".into(), 10i64.into()), Ordering::Greater);
        assert_eq!(cmp(&registry, TypeTag::Number, "10".into(), "9".into()), Ordering::Less);
        assert_eq!(cmp(&registry, TypeTag::Boolean, "yes".into(), false.into()), Ordering::Greater);

        let cells: Vec<Value> = vec![
            "10".into(),
            10i64.into(),
            true.into(),
            9i64.into(),
            Value::Null,
            2.5.into(),
            "9".into(),
        ];
        for a in &cells {
            for b in &cells {
                let forward = cmp(&registry, TypeTag::Number, a.clone(), b.clone());
                let backward = cmp(&registry, TypeTag::Number, b.clone(), a.clone());
                assert_eq!(forward, backward.reverse(), "{a:?} vs {b:?}");
            }
        }

        let mut sorted = cells.clone();
        sorted.sort_by(|a, b| registry.compare(TypeTag::Number, a, b).unwrap());
        assert_eq!(
            sorted,
            vec![
                Value::Null,
                2.5.into(),
                9i64.into(),
                10i64.into(),
                "10".into(),
                "9".into(),
                true.into(),
            ]
        );
    }

    #[test]
    fn test_geometry_unsupported() {
        let registry = ComparatorRegistry::new();
        assert!(!registry.supports(TypeTag::Geometry));
        assert!(registry.compare(TypeTag::Geometry, &Value::Null, &Value::Null).is_none());
        assert_eq!(
            registry.resolve(4, TypeTag::Geometry).err(),
            Some(SortError::UnsupportedColumnType {
                column: 4,
                type_tag: TypeTag::Geometry
            })
        );
    }

    #[test]
    fn test_register_and_unregister() {
        let mut registry = ComparatorRegistry::new();
        registry.register(TypeTag::Geometry, |a, b| a.to_string().len().cmp(&b.to_string().len()));
        assert!(registry.supports(TypeTag::Geometry));
        assert_eq!(
            cmp(
                &registry,
                TypeTag::Geometry,
                Value::Other("POINT(1 2)".into()),
                Value::Other("POINT(10 20)".into())
            ),
            Ordering::Less
        );

        assert!(registry.unregister(TypeTag::Text));
        assert!(registry.resolve(0, TypeTag::Text).is_err());
    }
}
