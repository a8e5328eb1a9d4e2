//! Raw request → structured query

use crate::config::SearchConfig;
use crate::error::{Result, TripError};
use crate::model::{
    CabinClass, Category, DateKind, DateQuery, DateRequest, LocationQuery, Pagination,
    SearchMode, SearchQuery, SearchRequest, TravelerRequest, Travelers,
};

/// Parse and normalize a search request
///
/// Fails with a validation error when no destination is supplied.
pub fn parse_search_query(request: &SearchRequest, config: &SearchConfig) -> Result<SearchQuery> {
    let destination = request
        .destination
        .as_ref()
        .and_then(normalize_location)
        .ok_or_else(|| TripError::Validation("Destination is required".to_string()))?;

    let origin = request.origin.as_ref().and_then(normalize_location);
    let categories = categories_for(request.mode, origin.is_some());
    let dates = normalize_dates(request.dates.as_ref(), config.default_flex_days)?;
    let travelers = normalize_travelers(request.travelers.as_ref(), request.cabin_class);

    let limit = request
        .options
        .limit
        .filter(|l| *l > 0)
        .unwrap_or(config.default_limit);

    Ok(SearchQuery {
        mode: request.mode,
        categories,
        destination,
        origin,
        dates,
        travelers,
        filters: request.filters.clone(),
        sort_by: request.sort_by.clone(),
        pagination: Pagination { page: 1, limit },
        currency: request
            .options
            .currency
            .as_ref()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty()),
    })
}

/// Target categories for a search mode
pub fn categories_for(mode: Option<SearchMode>, has_origin: bool) -> Vec<Category> {
    match mode {
        Some(SearchMode::Unified) => {
            let mut categories = Vec::with_capacity(3);
            if has_origin {
                categories.push(Category::Flights);
            }
            categories.push(Category::Hotels);
            categories.push(Category::Experiences);
            categories
        }
        Some(SearchMode::Flight) => vec![Category::Flights],
        Some(SearchMode::Hotel) => vec![Category::Hotels],
        Some(SearchMode::Car) => vec![Category::Cars],
        Some(SearchMode::Experience) => vec![Category::Experiences],
        Some(SearchMode::Package) => Category::ALL.to_vec(),
        Some(SearchMode::Plan) | None => vec![Category::Flights, Category::Hotels],
    }
}

/// Trim the text, uppercase the code, drop empty locations
fn normalize_location(location: &LocationQuery) -> Option<LocationQuery> {
    let code = location
        .code
        .as_ref()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty());

    let query = location.query.trim();
    let query = if query.is_empty() {
        code.clone()?
    } else {
        query.to_string()
    };

    Some(LocationQuery {
        query,
        code,
        location_type: location.location_type,
    })
}

fn normalize_dates(dates: Option<&DateRequest>, default_flex_days: u32) -> Result<DateQuery> {
    let Some(dates) = dates else {
        return Ok(DateQuery {
            kind: DateKind::Exact,
            start_date: None,
            end_date: None,
            flex_days: None,
        });
    };

    if let (Some(start), Some(end)) = (dates.start_date, dates.end_date) {
        if end < start {
            return Err(TripError::Validation(
                "End date must not be before start date".to_string(),
            ));
        }
    }

    let (kind, flex_days) = if dates.flexible {
        (
            DateKind::Flexible,
            Some(dates.flex_days.unwrap_or(default_flex_days)),
        )
    } else {
        (DateKind::Exact, None)
    };

    Ok(DateQuery {
        kind,
        start_date: dates.start_date,
        end_date: dates.end_date,
        flex_days,
    })
}

fn normalize_travelers(
    travelers: Option<&TravelerRequest>,
    cabin_class: Option<CabinClass>,
) -> Travelers {
    let default = TravelerRequest::default();
    let travelers = travelers.unwrap_or(&default);

    Travelers {
        adults: travelers.adults.filter(|a| *a > 0).unwrap_or(1),
        children: travelers
            .children
            .unwrap_or(travelers.children_ages.len() as u32),
        children_ages: travelers.children_ages.clone(),
        infants: travelers.infants.unwrap_or(0),
        cabin_class,
    }
}
