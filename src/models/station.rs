use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Station {
    #[validate(length(min = 1))]
    pub name: String,

    pub base_temperature: f64,
}

impl Station {
    pub fn new(name: impl Into<String>, base_temperature: f64) -> Self {
        Self {
            name: name.into(),
            base_temperature,
        }
    }

    /// Whether a generated reading could have come from this station
    pub fn accepts(&self, temperature: f64, jitter: f64, tolerance: f64) -> bool {
        let low = self.base_temperature - jitter - tolerance;
        let high = self.base_temperature + jitter + tolerance;
        (low..=high).contains(&temperature)
    }
}

/// Ordered, name-deduplicated set of stations.
///
/// Filled once by the station reader and shared read-only by every producer
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct StationTable {
    stations: Vec<Station>,
    index: HashMap<String, usize>,
}

impl StationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stations: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Add a station unless one with the same name is already present.
    /// The first occurrence wins.
    pub fn insert(&mut self, station: Station) -> bool {
        if self.index.contains_key(&station.name) {
            return false;
        }
        self.index.insert(station.name.clone(), self.stations.len());
        self.stations.push(station);
        true
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Station> {
        self.stations.get(idx)
    }

    pub fn lookup(&self, name: &str) -> Option<&Station> {
        self.index.get(name).map(|&idx| &self.stations[idx])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Station> {
        self.stations.iter()
    }

    pub fn as_slice(&self) -> &[Station] {
        &self.stations
    }
}

impl FromIterator<Station> for StationTable {
    fn from_iter<I: IntoIterator<Item = Station>>(iter: I) -> Self {
        let mut table = StationTable::new();
        for station in iter {
            table.insert(station);
        }
        table
    }
}

impl<'a> IntoIterator for &'a StationTable {
    type Item = &'a Station;
    type IntoIter = std::slice::Iter<'a, Station>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_validation() {
        assert!(Station::new("Hamburg", 9.7).validate().is_ok());
        assert!(Station::new("", 9.7).validate().is_err());
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let mut table = StationTable::new();
        assert!(table.insert(Station::new("A", 10.0)));
        assert!(table.insert(Station::new("B", 20.0)));
        assert!(!table.insert(Station::new("A", 99.0)));

        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("A").map(|s| s.base_temperature), Some(10.0));
        assert_eq!(table.get(1).map(|s| s.name.as_str()), Some("B"));
        assert!(table.lookup("C").is_none());
    }

    #[test]
    fn test_accepts_jitter_window() {
        let station = Station::new("A", 10.0);
        assert!(station.accepts(0.0, 10.0, 0.05));
        assert!(station.accepts(20.0, 10.0, 0.05));
        assert!(!station.accepts(20.1, 10.0, 0.05));
        assert!(!station.accepts(-0.1, 10.0, 0.05));
    }
}
