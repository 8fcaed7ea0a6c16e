//! Derived metrics shown next to each converted file.
//!
//! All functions are pure and operate on byte counts or the extracted text,
//! so they can be computed on demand instead of being stored.

use serde::Serialize;

/// Bytes per megabyte used for display (binary megabyte).
pub const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;

/// Default reading speed for the reading-time estimate.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Size reduction from source to converted text, in percent.
///
/// Returns `None` for a zero-byte source, where the ratio is undefined.
/// The value is negative when the text is larger than the upload.
pub fn size_reduction_percent(source_bytes: u64, converted_bytes: u64) -> Option<f64> {
    if source_bytes == 0 {
        return None;
    }
    Some(100.0 * (1.0 - converted_bytes as f64 / source_bytes as f64))
}

/// Bytes to megabytes, rounded to two decimal places.
pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_MEGABYTE)
}

/// Number of whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated reading time in whole minutes, never less than one.
///
/// `words / words_per_minute` rounded to the nearest minute. A zero
/// `words_per_minute` is treated as the default speed.
pub fn reading_time_minutes(text: &str, words_per_minute: u32) -> u64 {
    let wpm = if words_per_minute == 0 {
        DEFAULT_WORDS_PER_MINUTE
    } else {
        words_per_minute
    };
    let minutes = (word_count(text) as f64 / wpm as f64).round() as u64;
    minutes.max(1)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Display-ready metrics for one converted file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMetrics {
    pub source_size_bytes: u64,
    pub converted_size_bytes: u64,
    pub source_size_mb: f64,
    pub converted_size_mb: f64,
    /// `None` when the source was empty.
    pub size_reduction_percent: Option<f64>,
    pub word_count: usize,
    pub reading_time_minutes: u64,
}

impl ResultMetrics {
    pub fn compute(source_size_bytes: u64, text: &str, words_per_minute: u32) -> Self {
        let converted_size_bytes = text.len() as u64;
        Self {
            source_size_bytes,
            converted_size_bytes,
            source_size_mb: bytes_to_megabytes(source_size_bytes),
            converted_size_mb: bytes_to_megabytes(converted_size_bytes),
            size_reduction_percent: size_reduction_percent(
                source_size_bytes,
                converted_size_bytes,
            )
            .map(round2),
            word_count: word_count(text),
            reading_time_minutes: reading_time_minutes(text, words_per_minute),
        }
    }

    /// Reduction formatted for display, `"n/a"` for empty sources.
    pub fn reduction_label(&self) -> String {
        match self.size_reduction_percent {
            Some(pct) => format!("{pct:.1}%"),
            None => "n/a".to_string(),
        }
    }
}
