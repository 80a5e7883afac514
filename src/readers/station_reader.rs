use crate::error::{GeneratorError, Result};
use crate::models::{Station, StationTable};
use crate::utils::constants::{COMMENT_PREFIX, DEFAULT_UNIQUE_STATIONS};
use crate::utils::parse_temperature;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub struct StationReader {
    unique_stations: usize,
}

impl StationReader {
    pub fn new(unique_stations: usize) -> Self {
        Self { unique_stations }
    }

    /// Read the first `unique_stations` distinct stations from a
    /// `name;baseTemperature` file
    pub fn read_stations(&self, path: &Path) -> Result<StationTable> {
        let file = File::open(path)?;
        let table = self.read_from(BufReader::new(file))?;
        tracing::info!(
            "Loaded {} unique stations from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn read_from<R: BufRead>(&self, reader: R) -> Result<StationTable> {
        let mut table =
            StationTable::with_capacity(self.unique_stations.min(DEFAULT_UNIQUE_STATIONS));

        for (line_idx, line_result) in reader.lines().enumerate() {
            if table.len() >= self.unique_stations {
                break;
            }

            let line = line_result?;
            let line = line.trim_end_matches('\r');

            // Skip empty lines and comments
            if line.trim().is_empty() || line.starts_with(COMMENT_PREFIX) {
                continue;
            }

            let station = self.parse_station_line(line, line_idx + 1)?;
            table.insert(station);
        }

        if table.is_empty() {
            return Err(GeneratorError::EmptyStationTable);
        }

        if table.len() < self.unique_stations {
            tracing::warn!(
                "Requested {} unique stations but the file only holds {}",
                self.unique_stations,
                table.len()
            );
        }

        Ok(table)
    }

    /// Parse a single `name;baseTemperature` line
    fn parse_station_line(&self, line: &str, line_number: usize) -> Result<Station> {
        let (name, temperature) = line.split_once(';').ok_or_else(|| {
            GeneratorError::InvalidFormat(format!(
                "line {}: expected 'name;temperature', got '{}'",
                line_number, line
            ))
        })?;

        if name.is_empty() {
            return Err(GeneratorError::InvalidFormat(format!(
                "line {}: empty station name",
                line_number
            )));
        }

        let base_temperature = parse_temperature(temperature).ok_or_else(|| {
            GeneratorError::InvalidFormat(format!(
                "line {}: invalid temperature '{}'",
                line_number, temperature
            ))
        })?;

        Ok(Station::new(name, base_temperature))
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new(DEFAULT_UNIQUE_STATIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_station_line() {
        let reader = StationReader::default();

        let station = reader.parse_station_line("Abéché;29.4", 1).unwrap();
        assert_eq!(station, Station::new("Abéché", 29.4));

        let station = reader.parse_station_line("St. John's;-0.5", 1).unwrap();
        assert_eq!(station.name, "St. John's");
        assert_eq!(station.base_temperature, -0.5);
    }

    #[test]
    fn test_malformed_lines_name_the_line() {
        let reader = StationReader::default();

        let err = reader.parse_station_line("no separator", 7).unwrap_err();
        assert!(err.to_string().contains("line 7"));

        let err = reader.parse_station_line("Oslo;warm", 3).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidFormat(_)));

        assert!(reader.parse_station_line(";12.0", 1).is_err());
    }

    #[test]
    fn test_read_stations_file() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "# Adapted from https://simplemaps.com/data/world-cities")?;
        writeln!(temp_file, "# Licensed under Creative Commons Attribution 4.0")?;
        writeln!(temp_file)?;
        writeln!(temp_file, "Tokyo;35.6897")?;
        writeln!(temp_file, "Jakarta;-6.1750")?;
        writeln!(temp_file, "Tokyo;99.0")?;
        writeln!(temp_file, "Delhi;28.6100")?;

        let stations = StationReader::new(10).read_stations(temp_file.path())?;

        assert_eq!(stations.len(), 3);
        assert_eq!(stations.get(0).map(|s| s.name.as_str()), Some("Tokyo"));
        assert_eq!(stations.lookup("Tokyo").map(|s| s.base_temperature), Some(35.6897));
        assert_eq!(stations.get(2).map(|s| s.name.as_str()), Some("Delhi"));

        Ok(())
    }

    #[test]
    fn test_stops_after_unique_limit() -> Result<()> {
        // The malformed line after the limit is never parsed
        let input = "A;1.0\nA;2.0\nB;3.0\nC;4.0\nbroken\n";
        let stations = StationReader::new(3).read_from(Cursor::new(input))?;

        let names: Vec<&str> = stations.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        Ok(())
    }

    #[test]
    fn test_crlf_line_endings() -> Result<()> {
        let stations = StationReader::new(5).read_from(Cursor::new("A;1.5\r\nB;-2.5\r\n"))?;
        assert_eq!(stations.lookup("B").map(|s| s.base_temperature), Some(-2.5));
        Ok(())
    }

    #[test]
    fn test_empty_file_is_fatal() {
        let result = StationReader::new(5).read_from(Cursor::new("# only comments\n\n"));
        assert!(matches!(result, Err(GeneratorError::EmptyStationTable)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = StationReader::new(5).read_stations(Path::new("/nonexistent/stations.csv"));
        assert!(matches!(result, Err(GeneratorError::Io(_))));
    }
}
