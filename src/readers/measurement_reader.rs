use crate::error::{GeneratorError, Result};
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A `name;temperature` line split into its fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement<'a> {
    pub station: &'a str,
    pub temperature: f64,
}

/// Streams a generated measurements file line by line without collecting it
pub struct MeasurementReader {
    use_mmap: bool,
}

impl MeasurementReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// Call `visit` with the 1-based line number and text of every line
    pub fn for_each_line<F>(&self, path: &Path, visit: F) -> Result<()>
    where
        F: FnMut(usize, &str) -> Result<()>,
    {
        if self.use_mmap {
            self.for_each_line_mmap(path, visit)
        } else {
            self.for_each_line_buffered(path, visit)
        }
    }

    fn for_each_line_buffered<F>(&self, path: &Path, mut visit: F) -> Result<()>
    where
        F: FnMut(usize, &str) -> Result<()>,
    {
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);

        for (idx, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            visit(idx + 1, &line)?;
        }

        Ok(())
    }

    fn for_each_line_mmap<F>(&self, path: &Path, mut visit: F) -> Result<()>
    where
        F: FnMut(usize, &str) -> Result<()>,
    {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(());
        }

        let mmap = unsafe { Mmap::map(&file)? };
        let content = std::str::from_utf8(&mmap)
            .map_err(|e| GeneratorError::InvalidFormat(format!("Invalid UTF-8: {}", e)))?;

        for (idx, line) in content.lines().enumerate() {
            visit(idx + 1, line)?;
        }

        Ok(())
    }
}

impl Default for MeasurementReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a generated line, requiring exactly one fractional digit
pub fn parse_measurement(line: &str) -> Option<Measurement<'_>> {
    let (station, temperature) = line.rsplit_once(';')?;
    if station.is_empty() || !is_one_decimal(temperature) {
        return None;
    }

    Some(Measurement {
        station,
        temperature: temperature.parse().ok()?,
    })
}

fn is_one_decimal(field: &str) -> bool {
    let digits = field.strip_prefix('-').unwrap_or(field);
    match digits.split_once('.') {
        Some((whole, frac)) => {
            !whole.is_empty()
                && whole.bytes().all(|b| b.is_ascii_digit())
                && frac.len() == 1
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}
