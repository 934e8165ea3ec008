//! Shot statistics.
//!
//! [`ShotSummary::from_boundaries`] reduces a list of shot boundaries to the
//! four numbers stored per video. The edge cases are part of the published
//! dataset and must not drift:
//!
//! | boundaries | `num_shots` | `shot_durations` | average / variance |
//! |-----------:|------------:|------------------|--------------------|
//! | 0          | 1           | empty            | 0 / 0              |
//! | 1          | 1           | one entry        | 0 / 0              |
//! | n ≥ 2      | n           | n entries        | mean / sample var  |

use crate::conversion::{format_decimal, round_to};

/// Start and end of one shot, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotBoundary {
    /// Shot start.
    pub start: f64,
    /// Shot end (exclusive).
    pub end: f64,
}

impl ShotBoundary {
    /// Create a boundary from start and end seconds.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Shot length in seconds, rounded to 4 decimal places.
    pub fn duration(&self) -> f64 {
        round_to(self.end - self.start, 4)
    }
}

/// Aggregate statistics of a video's shots.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotSummary {
    /// Number of shots; never less than 1.
    pub num_shots: usize,
    /// Length of each shot in seconds, in timeline order.
    pub shot_durations: Vec<f64>,
    /// Sample (n − 1) variance of `shot_durations`, or 0 with fewer than two
    /// boundaries.
    pub shot_duration_variance: f64,
    /// Mean of `shot_durations` rounded to 4 places, or 0 with fewer than two
    /// boundaries.
    pub average_shot_duration: f64,
}

impl ShotSummary {
    /// Aggregate an ordered list of shot boundaries.
    ///
    /// A single boundary still populates `shot_durations` but leaves the
    /// average at 0; downstream analysis was run with this behaviour.
    pub fn from_boundaries(boundaries: &[ShotBoundary]) -> Self {
        let shot_durations: Vec<f64> = boundaries.iter().map(ShotBoundary::duration).collect();
        let multi_shot = boundaries.len() > 1;

        Self {
            num_shots: boundaries.len().max(1),
            shot_duration_variance: if multi_shot {
                sample_variance(&shot_durations)
            } else {
                0.0
            },
            average_shot_duration: if multi_shot {
                round_to(mean(&shot_durations), 4)
            } else {
                0.0
            },
            shot_durations,
        }
    }

    /// Whether the per-shot durations are meaningful enough to publish.
    ///
    /// Tables leave the duration list empty below two boundaries.
    pub fn has_duration_list(&self) -> bool {
        self.shot_durations.len() > 1
    }

    /// Space-separated duration list as written to CSV.
    pub fn durations_field(&self) -> String {
        if !self.has_duration_list() {
            return String::new();
        }
        self.shot_durations
            .iter()
            .map(|&duration| format_decimal(duration))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Bessel-corrected sample variance; 0 for fewer than two values.
///
/// Two-pass over the deviations from the mean.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let center = mean(values);
    let squared: f64 = values.iter().map(|value| (value - center).powi(2)).sum();
    squared / (values.len() - 1) as f64
}

/// Parse a space-separated duration list as written by
/// [`ShotSummary::durations_field`].
pub fn parse_durations(field: &str) -> Result<Vec<f64>, std::num::ParseFloatError> {
    field.split_whitespace().map(str::parse).collect()
}
