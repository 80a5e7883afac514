use crate::error::{GeneratorError, Result};
use std::io::Write;

/// Render `value` with exactly one fractional digit into `scratch`.
///
/// Returns the number of bytes written. A value that does not fit is an error,
/// never a truncated rendering.
///
/// # Examples
/// ```
/// use station_datagen::utils::format_temperature;
///
/// let mut scratch = [0u8; 16];
/// let len = format_temperature(23.44, &mut scratch).unwrap();
/// assert_eq!(&scratch[..len], b"23.4");
/// ```
pub fn format_temperature(value: f64, scratch: &mut [u8]) -> Result<usize> {
    let capacity = scratch.len();
    let mut cursor = &mut scratch[..];
    write!(cursor, "{:.1}", value).map_err(|_| GeneratorError::Format { value, capacity })?;
    Ok(capacity - cursor.len())
}

/// Parse a temperature field, rejecting non-finite values
pub fn parse_temperature(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|t| t.is_finite())
}
