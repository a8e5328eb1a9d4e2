//! Dotted-path field access over unified results
//!
//! Filters and sorts are defined against field paths such as `price.amount`
//! or `starRating`. This module is the single place that maps a path to the
//! matching attribute of each category payload.

use crate::model::{Scalar, ResultDetails, UnifiedResult};

/// Value of one field on one result
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Scalar>),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Scalars carried by this value; lists expand, missing is empty
    pub fn scalars(&self) -> Vec<Scalar> {
        match self {
            FieldValue::Missing => Vec::new(),
            FieldValue::Bool(b) => vec![Scalar::Bool(*b)],
            FieldValue::Number(n) => vec![Scalar::Number(*n)],
            FieldValue::Text(s) => vec![Scalar::Text(s.clone())],
            FieldValue::List(items) => items.clone(),
        }
    }
}

fn num<T: Into<f64> + Copy>(v: Option<T>) -> FieldValue {
    v.map(|n| FieldValue::Number(n.into()))
        .unwrap_or(FieldValue::Missing)
}

fn flag(v: Option<bool>) -> FieldValue {
    v.map(FieldValue::Bool).unwrap_or(FieldValue::Missing)
}

fn text(v: &str) -> FieldValue {
    FieldValue::Text(v.to_string())
}

fn opt_text(v: &Option<String>) -> FieldValue {
    v.as_deref().map(text).unwrap_or(FieldValue::Missing)
}

fn list(items: &[String]) -> FieldValue {
    FieldValue::List(items.iter().cloned().map(Scalar::Text).collect())
}

/// Resolve a dotted field path against a result
pub fn field_value(result: &UnifiedResult, path: &str) -> FieldValue {
    match path {
        "id" => return text(&result.id),
        "provider.code" => return text(&result.provider.code),
        "provider.name" => return text(&result.provider.name),
        "price.amount" => return FieldValue::Number(result.price.amount),
        "price.currency" => return text(&result.price.currency),
        "ranking.totalScore" => return num(result.ranking.as_ref().map(|r| r.total_score)),
        "ranking.rank" => return num(result.ranking.as_ref().map(|r| r.rank as f64)),
        _ => {}
    }

    match (&result.details, path) {
        (ResultDetails::Flight(f), "airlines") => list(&f.airlines),
        (ResultDetails::Flight(f), "flightNumbers") => list(&f.flight_numbers),
        (ResultDetails::Flight(f), "stops") => FieldValue::Number(f.stops.into()),
        (ResultDetails::Flight(f), "totalDurationMinutes") => num(f.total_duration_minutes),
        (ResultDetails::Flight(f), "departureTime") => {
            num(f.departure_time.map(|t| t.timestamp_millis() as f64))
        }
        (ResultDetails::Flight(f), "refundable") => flag(f.refundable),
        (ResultDetails::Flight(f), "cabinClass") => f
            .cabin_class
            .and_then(|c| serde_json::to_value(c).ok())
            .and_then(|v| v.as_str().map(text))
            .unwrap_or(FieldValue::Missing),

        (ResultDetails::Hotel(h), "name") => text(&h.name),
        (ResultDetails::Hotel(h), "starRating") => num(h.star_rating),
        (ResultDetails::Hotel(h), "guestRating") => num(h.guest_rating),
        (ResultDetails::Hotel(h), "reviewCount") => num(h.review_count),
        (ResultDetails::Hotel(h), "distanceFromCenter") => num(h.distance_from_center),
        (ResultDetails::Hotel(h), "amenities") => list(&h.amenities),
        (ResultDetails::Hotel(h), "freeCancellation") => flag(h.free_cancellation),

        (ResultDetails::Car(c), "vehicleName") => text(&c.vehicle_name),
        (ResultDetails::Car(c), "vehicleType") => text(&c.vehicle_type),
        (ResultDetails::Car(c), "transmission") => opt_text(&c.transmission),
        (ResultDetails::Car(c), "seats") => num(c.seats),

        (ResultDetails::Experience(e), "title") => text(&e.title),
        (ResultDetails::Experience(e), "durationMinutes") => num(e.duration_minutes),
        (ResultDetails::Experience(e), "rating") => num(e.rating),
        (ResultDetails::Experience(e), "reviewCount") => num(e.review_count),
        (ResultDetails::Experience(e), "categories") => list(&e.categories),
        (ResultDetails::Experience(e), "freeCancellation") => flag(e.free_cancellation),

        _ => FieldValue::Missing,
    }
}

/// Equality used by filter matching; numbers compare with a small tolerance
pub fn scalar_eq(a: &Scalar, b: &Scalar) -> bool {
    match (a, b) {
        (Scalar::Number(x), Scalar::Number(y)) => (x - y).abs() < 1e-9,
        (Scalar::Text(x), Scalar::Text(y)) => x == y,
        (Scalar::Bool(x), Scalar::Bool(y)) => x == y,
        _ => false,
    }
}
