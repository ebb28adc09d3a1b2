//! Buffered range display math
//!
//! Converts the raw buffered ranges of a media element into percentages of
//! the total duration. Starts round down and ends round up so the displayed
//! bars never under-report what is buffered. A zero or NaN duration is not
//! special-cased: the resulting NaN/infinite percentages are passed through
//! and presentation code decides what to draw.

use crate::types::{same_f64, TimeRange};
use serde::{Deserialize, Serialize};

/// A buffered section expressed in percent of the duration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferedRange {
    /// Built from the raw start/end so UI lists can reconcile bars
    pub key: String,
    /// Start position in percent (0..100)
    pub start: f64,
    /// End position in percent (0..100)
    pub end: f64,
}

impl PartialEq for BufferedRange {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && same_f64(self.start, other.start) && same_f64(self.end, other.end)
    }
}

/// Convert raw ranges into percent-based display sections, preserving order
pub fn compute_buffered_sections(ranges: &[TimeRange], duration: f64) -> Vec<BufferedRange> {
    ranges
        .iter()
        .map(|range| BufferedRange {
            key: format!("{}-{}", js_number(range.start), js_number(range.end)),
            start: (range.start / duration * 10_000.0).floor() / 100.0,
            end: (range.end / duration * 10_000.0).ceil() / 100.0,
        })
        .collect()
}

/// Percent buffered up to the end of the last range, 0 with no ranges
pub fn buffered_percent(ranges: &[TimeRange], duration: f64) -> f64 {
    match ranges.last() {
        Some(last) => last.end / duration * 100.0,
        None => 0.0,
    }
}

/// Render a number the way browsers stringify it (`1`, `1.5`, `Infinity`)
fn js_number(value: f64) -> String {
    if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value == 0.0 {
        // Covers -0.0
        "0".to_string()
    } else {
        value.to_string()
    }
}
