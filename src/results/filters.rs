//! Category filter schemas and filter evaluation

use super::fields::{field_value, scalar_eq, FieldValue};
use crate::model::{Category, FilterValue, Scalar, UnifiedResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Filter id → selected value
pub type AppliedFilters = BTreeMap<String, FilterValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Boolean,
    Range,
    MultiSelect,
    SingleSelect,
}

/// One entry of a category's filter schema
#[derive(Debug, Clone, Copy)]
pub struct FilterSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub filter_type: FilterType,
    pub field: &'static str,
}

const fn filter_spec(
    id: &'static str,
    label: &'static str,
    filter_type: FilterType,
    field: &'static str,
) -> FilterSpec {
    FilterSpec {
        id,
        label,
        filter_type,
        field,
    }
}

const FLIGHT_FILTERS: &[FilterSpec] = &[
    filter_spec("stops", "Stops", FilterType::MultiSelect, "stops"),
    filter_spec("price", "Price", FilterType::Range, "price.amount"),
    filter_spec("airlines", "Airlines", FilterType::MultiSelect, "airlines"),
    filter_spec("refundable", "Refundable", FilterType::Boolean, "refundable"),
];

const HOTEL_FILTERS: &[FilterSpec] = &[
    filter_spec("price", "Price per night", FilterType::Range, "price.amount"),
    filter_spec("starRating", "Star rating", FilterType::MultiSelect, "starRating"),
    filter_spec("guestRating", "Guest rating", FilterType::Range, "guestRating"),
    filter_spec("amenities", "Amenities", FilterType::MultiSelect, "amenities"),
    filter_spec(
        "freeCancellation",
        "Free cancellation",
        FilterType::Boolean,
        "freeCancellation",
    ),
];

const CAR_FILTERS: &[FilterSpec] = &[
    filter_spec("price", "Price", FilterType::Range, "price.amount"),
    filter_spec("vehicleType", "Vehicle type", FilterType::MultiSelect, "vehicleType"),
    filter_spec(
        "transmission",
        "Transmission",
        FilterType::SingleSelect,
        "transmission",
    ),
];

const EXPERIENCE_FILTERS: &[FilterSpec] = &[
    filter_spec("price", "Price", FilterType::Range, "price.amount"),
    filter_spec("duration", "Duration", FilterType::Range, "durationMinutes"),
    filter_spec("rating", "Rating", FilterType::Range, "rating"),
    filter_spec("categories", "Category", FilterType::MultiSelect, "categories"),
];

/// Fixed filter schema for a category
pub fn filter_schema(category: Category) -> &'static [FilterSpec] {
    match category {
        Category::Flights => FLIGHT_FILTERS,
        Category::Hotels => HOTEL_FILTERS,
        Category::Cars => CAR_FILTERS,
        Category::Experiences => EXPERIENCE_FILTERS,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: Scalar,
    pub label: String,
    pub count: usize,
}

/// Filter as presented to the UI, with options and bounds for the current set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDefinition {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub field: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FilterOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterStats {
    pub input_count: usize,
    pub output_count: usize,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub filtered_results: Vec<UnifiedResult>,
    pub available_filters: Vec<FilterDefinition>,
    pub applied_filters: AppliedFilters,
    pub stats: FilterStats,
}

/// Filter a result list and describe the filters available over it
///
/// Filter ids outside the category schema are ignored.
pub fn apply_filters(
    results: &[UnifiedResult],
    category: Category,
    applied: &AppliedFilters,
) -> FilterOutcome {
    let schema = filter_schema(category);

    let active: Vec<(&FilterSpec, &FilterValue)> = schema
        .iter()
        .filter_map(|spec| applied.get(spec.id).map(|value| (spec, value)))
        .collect();

    let filtered_results: Vec<UnifiedResult> = results
        .iter()
        .filter(|result| active.iter().all(|(spec, value)| matches(result, spec, value)))
        .cloned()
        .collect();

    let available_filters = schema
        .iter()
        .map(|spec| describe(spec, results, &filtered_results))
        .collect();

    let stats = FilterStats {
        input_count: results.len(),
        output_count: filtered_results.len(),
    };

    tracing::debug!(
        "Filtered {} {} down to {} with {} active filters",
        stats.input_count,
        category,
        stats.output_count,
        active.len()
    );

    FilterOutcome {
        filtered_results,
        available_filters,
        applied_filters: applied.clone(),
        stats,
    }
}

/// Whether a result passes one filter
pub fn matches(result: &UnifiedResult, spec: &FilterSpec, value: &FilterValue) -> bool {
    let field = field_value(result, spec.field);

    match spec.filter_type {
        FilterType::Boolean => match (selected_bool(value), &field) {
            (Some(want), FieldValue::Bool(have)) => want == *have,
            (Some(_), _) => false,
            (None, _) => true,
        },
        FilterType::Range => {
            let FilterValue::Range { min, max } = value else {
                return true;
            };
            // Non-numeric values are not range-checked
            let Some(n) = field.as_number() else {
                return true;
            };
            min.map_or(true, |m| n >= m) && max.map_or(true, |m| n <= m)
        }
        FilterType::MultiSelect => {
            let selected = selected_values(value);
            if selected.is_empty() {
                return true;
            }
            field
                .scalars()
                .iter()
                .any(|candidate| selected.iter().any(|s| scalar_eq(candidate, s)))
        }
        FilterType::SingleSelect => match selected_values(value).first() {
            Some(want) => field.scalars().iter().any(|have| scalar_eq(have, want)),
            None => true,
        },
    }
}

fn selected_bool(value: &FilterValue) -> Option<bool> {
    match value {
        FilterValue::Bool(b) | FilterValue::Single(Scalar::Bool(b)) => Some(*b),
        _ => None,
    }
}

fn selected_values(value: &FilterValue) -> Vec<Scalar> {
    match value {
        FilterValue::List(items) => items.clone(),
        FilterValue::Single(s) => vec![s.clone()],
        FilterValue::Bool(b) => vec![Scalar::Bool(*b)],
        FilterValue::Range { .. } => Vec::new(),
    }
}

fn describe(
    spec: &FilterSpec,
    base: &[UnifiedResult],
    filtered: &[UnifiedResult],
) -> FilterDefinition {
    let mut definition = FilterDefinition {
        id: spec.id.to_string(),
        label: spec.label.to_string(),
        filter_type: spec.filter_type,
        field: spec.field.to_string(),
        options: Vec::new(),
        min: None,
        max: None,
    };

    match spec.filter_type {
        FilterType::MultiSelect | FilterType::SingleSelect => {
            definition.options = distinct_values(spec.field, base)
                .into_iter()
                .map(|value| {
                    let count = filtered
                        .iter()
                        .filter(|r| {
                            field_value(r, spec.field)
                                .scalars()
                                .iter()
                                .any(|v| scalar_eq(v, &value))
                        })
                        .count();
                    FilterOption {
                        label: value.label(),
                        value,
                        count,
                    }
                })
                .collect();
        }
        FilterType::Range => {
            for n in base.iter().filter_map(|r| field_value(r, spec.field).as_number()) {
                definition.min = Some(definition.min.map_or(n, |m| m.min(n)));
                definition.max = Some(definition.max.map_or(n, |m| m.max(n)));
            }
        }
        FilterType::Boolean => {}
    }

    definition
}

fn distinct_values(field: &str, results: &[UnifiedResult]) -> Vec<Scalar> {
    let mut values: Vec<Scalar> = Vec::new();
    for result in results {
        for value in field_value(result, field).scalars() {
            if !values.iter().any(|v| scalar_eq(v, &value)) {
                values.push(value);
            }
        }
    }
    values.sort_by(option_order);
    values
}

fn option_order(a: &Scalar, b: &Scalar) -> Ordering {
    match (a, b) {
        (Scalar::Number(x), Scalar::Number(y)) => x.total_cmp(y),
        (Scalar::Text(x), Scalar::Text(y)) => x.cmp(y),
        (Scalar::Bool(x), Scalar::Bool(y)) => x.cmp(y),
        (Scalar::Number(_), _) => Ordering::Less,
        (_, Scalar::Number(_)) => Ordering::Greater,
        (Scalar::Text(_), _) => Ordering::Less,
        (_, Scalar::Text(_)) => Ordering::Greater,
    }
}
