use super::{Destination, DestinationCatalog, PreferenceStore};
use crate::error::{Result, TripError};
use crate::model::{DestinationIntel, UserPreferences};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const BUNDLED_CATALOG: &str = include_str!("destinations.toml");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    destinations: Vec<Destination>,
}

/// Destination catalog held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    destinations: Vec<Destination>,
}

impl InMemoryCatalog {
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self { destinations }
    }

    /// Catalog compiled into the binary
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(BUNDLED_CATALOG)
    }

    /// Load catalog entries from a TOML file with `[[destinations]]` tables
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TripError::Io {
            source: e,
            context: format!("Failed to read destinations file: {}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        tracing::debug!("Loaded {} catalog destinations", file.destinations.len());
        Ok(Self::new(file.destinations))
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    fn find(&self, input: &str) -> Option<&Destination> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        if let Some(hit) = self
            .destinations
            .iter()
            .find(|d| d.code.to_lowercase() == needle)
        {
            return Some(hit);
        }

        if let Some(hit) = self.destinations.iter().find(|d| {
            d.name.to_lowercase() == needle || d.aliases.iter().any(|a| a.to_lowercase() == needle)
        }) {
            return Some(hit);
        }

        // Fuzzy: prefix beats substring, popularity breaks ties
        self.most_popular(|name| name.starts_with(&needle))
            .or_else(|| self.most_popular(|name| name.contains(&needle)))
    }

    fn most_popular(&self, pred: impl Fn(&str) -> bool) -> Option<&Destination> {
        self.destinations
            .iter()
            .filter(|d| pred(&d.name.to_lowercase()))
            .max_by(|a, b| a.popularity.total_cmp(&b.popularity))
    }

    fn by_popularity(&self) -> Vec<&Destination> {
        let mut sorted: Vec<&Destination> = self.destinations.iter().collect();
        sorted.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
        sorted
    }
}

#[async_trait]
impl DestinationCatalog for InMemoryCatalog {
    async fn lookup(&self, code_or_name: &str) -> Result<Option<Destination>> {
        Ok(self.find(code_or_name).cloned())
    }

    async fn intelligence(&self, code: &str) -> Result<Option<DestinationIntel>> {
        Ok(self
            .destinations
            .iter()
            .find(|d| d.code.eq_ignore_ascii_case(code))
            .and_then(Destination::intel))
    }

    async fn search(&self, text: &str, limit: usize) -> Result<Vec<Destination>> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .by_popularity()
            .into_iter()
            .filter(|d| {
                d.name.to_lowercase().contains(&needle) || d.code.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn trending(&self, limit: usize) -> Result<Vec<Destination>> {
        Ok(self
            .by_popularity()
            .into_iter()
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Fixed preference records keyed by user id
#[derive(Debug, Clone, Default)]
pub struct StaticPreferences {
    users: HashMap<String, UserPreferences>,
}

impl StaticPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: impl Into<String>, prefs: UserPreferences) -> Self {
        self.users.insert(user_id.into(), prefs);
        self
    }
}

#[async_trait]
impl PreferenceStore for StaticPreferences {
    async fn preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
        Ok(self.users.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LocationType;

    #[test]
    fn test_bundled_catalog_parses() {
        let catalog = InMemoryCatalog::bundled().unwrap();
        assert!(catalog.len() >= 10);
    }

    #[tokio::test]
    async fn test_lookup_by_code_name_and_fuzzy() {
        let catalog = InMemoryCatalog::bundled().unwrap();

        let by_code = catalog.lookup("par").await.unwrap().unwrap();
        assert_eq!(by_code.name, "Paris");

        let by_name = catalog.lookup("Paris").await.unwrap().unwrap();
        assert_eq!(by_name.code, "PAR");

        let by_alias = catalog.lookup("Roma").await.unwrap().unwrap();
        assert_eq!(by_alias.code, "ROM");

        let fuzzy = catalog.lookup("barc").await.unwrap().unwrap();
        assert_eq!(fuzzy.code, "BCN");

        let airport = catalog.lookup("Heathrow").await.unwrap().unwrap();
        assert_eq!(airport.location_type, LocationType::Airport);

        assert!(catalog.lookup("Atlantis").await.unwrap().is_none());
        assert!(catalog.lookup("   ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_intelligence() {
        let catalog = InMemoryCatalog::bundled().unwrap();

        let intel = catalog.intelligence("PAR").await.unwrap().unwrap();
        assert_eq!(intel.avg_hotel_price, Some(210.0));
        assert!(intel.tags.contains(&"museums".to_string()));

        // Airports carry no pricing data
        assert!(catalog.intelligence("CDG").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_and_trending_order() {
        let catalog = InMemoryCatalog::bundled().unwrap();

        let hits = catalog.search("lon", 10).await.unwrap();
        assert_eq!(hits[0].code, "LON");
        assert!(hits.iter().any(|d| d.code == "LHR"));

        let trending = catalog.trending(3).await.unwrap();
        assert_eq!(trending.len(), 3);
        assert_eq!(trending[0].code, "PAR");
        assert!(trending[0].popularity >= trending[1].popularity);
    }

    #[tokio::test]
    async fn test_static_preferences() {
        let prefs = StaticPreferences::new().with_user(
            "u1",
            UserPreferences {
                preferred_airlines: vec!["AF".to_string()],
                ..Default::default()
            },
        );

        assert!(prefs.preferences("u1").await.unwrap().is_some());
        assert!(prefs.preferences("u2").await.unwrap().is_none());
    }
}
