use crate::error::GeocodeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use waypoint_parser::normalize_name;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// External geocoding collaborator
///
/// `Ok(None)` means the name is unknown; `Err` is a transient failure that a
/// later pass may retry.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<Option<LatLng>, GeocodeError>;
}

/// In-memory gazetteer keyed by normalized name
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    places: HashMap<String, LatLng>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(mut self, name: &str, lat: f64, lng: f64) -> Self {
        self.insert(name, lat, lng);
        self
    }

    pub fn insert(&mut self, name: &str, lat: f64, lng: f64) {
        self.places.insert(normalize_name(name), LatLng::new(lat, lng));
    }

    /// Load a `{ "name": [lat, lng] }` map
    pub fn from_json(json: &str) -> Result<Self, GeocodeError> {
        let raw: HashMap<String, (f64, f64)> = serde_json::from_str(json)?;
        let mut geocoder = Self::new();
        for (name, (lat, lng)) in raw {
            geocoder.insert(&name, lat, lng);
        }
        Ok(geocoder)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn lookup(&self, name: &str) -> Result<Option<LatLng>, GeocodeError> {
        Ok(self.places.get(&normalize_name(name)).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_lookup_ignores_case() {
        let geocoder = StaticGeocoder::new().with_place("Eiffel Tower", 48.8584, 2.2945);

        assert_eq!(
            geocoder.lookup(" eiffel TOWER").await,
            Ok(Some(LatLng::new(48.8584, 2.2945)))
        );
        assert_eq!(geocoder.lookup("Atlantis").await, Ok(None));
    }

    #[test]
    fn test_from_json() {
        let geocoder = StaticGeocoder::from_json(r#"{ "Louvre": [48.8606, 2.3376], "Rome": [41.9, 12.5] }"#).unwrap();
        assert_eq!(geocoder.len(), 2);

        let err = StaticGeocoder::from_json(r#"{ "Louvre": "somewhere" }"#).unwrap_err();
        assert!(matches!(err, GeocodeError::InvalidGazetteer(_)));
    }
}
