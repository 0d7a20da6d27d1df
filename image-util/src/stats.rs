//! Order statistics used when combining weight maps

use std::cmp::Ordering;

/// Calculate median of a sequence of f64 values
///
/// NaN values are filtered out; infinite values take part. For even-length
/// data the two middle values are averaged. Returns `None` when nothing but
/// NaN (or nothing at all) was supplied.
pub fn median<'a, I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut valid_values: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).copied().collect();

    if valid_values.is_empty() {
        return None;
    }

    valid_values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = valid_values.len() / 2;
    let median_value = if valid_values.len() % 2 == 0 {
        (valid_values[mid - 1] + valid_values[mid]) / 2.0
    } else {
        valid_values[mid]
    };

    Some(median_value)
}
