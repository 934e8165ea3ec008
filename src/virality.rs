//! Virality buckets.
//!
//! View counts are binned on the edges `[-1, 1e3, 1e4, 1e5, 1e6, ∞]` into five
//! ordered labels that serve as the classification target.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Finite inner bin edges; the outer edges are -1 and +∞.
pub const BIN_EDGES: [u64; 4] = [1_000, 10_000, 100_000, 1_000_000];

/// Ordinal popularity label derived from a view count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViralityBucket {
    /// Up to about a thousand views.
    VeryLow,
    /// Up to about ten thousand views.
    Low,
    /// Up to about a hundred thousand views.
    Medium,
    /// Up to about a million views.
    High,
    /// Beyond a million views.
    VeryHigh,
}

/// Which side of each interval contains its edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinClosure {
    /// `(a, b]`: an edge value belongs to the lower bucket.
    #[default]
    Right,
    /// `[a, b)`: an edge value belongs to the upper bucket.
    Left,
}

impl FromStr for BinClosure {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "right" => Ok(BinClosure::Right),
            "left" => Ok(BinClosure::Left),
            other => Err(format!("unsupported bin closure: {other}")),
        }
    }
}

impl ViralityBucket {
    /// All buckets in ascending order.
    pub const ALL: [ViralityBucket; 5] = [
        ViralityBucket::VeryLow,
        ViralityBucket::Low,
        ViralityBucket::Medium,
        ViralityBucket::High,
        ViralityBucket::VeryHigh,
    ];

    /// Bucket for `view_count` under the given closure.
    ///
    /// ```
    /// use cutrate::{BinClosure, ViralityBucket};
    ///
    /// assert_eq!(ViralityBucket::from_views(999, BinClosure::Right), ViralityBucket::VeryLow);
    /// assert_eq!(ViralityBucket::from_views(1_000, BinClosure::Left), ViralityBucket::Low);
    /// ```
    pub fn from_views(view_count: u64, closure: BinClosure) -> Self {
        let index = BIN_EDGES
            .iter()
            .take_while(|&&edge| match closure {
                BinClosure::Right => view_count > edge,
                BinClosure::Left => view_count >= edge,
            })
            .count();
        Self::ALL[index]
    }

    /// Human-readable label as written to the feature table.
    pub fn label(self) -> &'static str {
        match self {
            ViralityBucket::VeryLow => "Very Low",
            ViralityBucket::Low => "Low",
            ViralityBucket::Medium => "Medium",
            ViralityBucket::High => "High",
            ViralityBucket::VeryHigh => "Very High",
        }
    }
}

impl Display for ViralityBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

impl FromStr for ViralityBucket {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown virality bucket: {value}"))
    }
}
