//! Batch configuration.
//!
//! [`BatchOptions`] threads the duration ceiling, progress callbacks and
//! cancellation tokens through the resumable stages without widening every
//! function signature. [`FeatureOptions`] fixes the shape of the feature
//! table.
//!
//! # Example
//!
//! ```no_run
//! use cutrate::{BatchOptions, CancellationToken};
//!
//! let token = CancellationToken::new();
//! let options = BatchOptions::new()
//!     .with_max_duration(300.0)
//!     .with_cancellation(token.clone());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::virality::BinClosure;

/// Videos longer than this many seconds are out of scope by default.
pub const DEFAULT_MAX_DURATION_SECONDS: f64 = 180.0;

/// Default number of TF-IDF components for title and description each.
pub const DEFAULT_MAX_FEATURES: usize = 50;

/// Settings shared by the resumable batch stages.
#[derive(Clone)]
pub struct BatchOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N rows).
    pub(crate) batch_size: u64,
    /// Rows with a longer `duration` are skipped.
    pub(crate) max_duration: f64,
}

impl Debug for BatchOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("BatchOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("max_duration", &self.max_duration)
            .finish()
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchOptions {
    /// Defaults: no progress callback, no cancellation, batch size 1,
    /// 180 second ceiling.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            max_duration: DEFAULT_MAX_DURATION_SECONDS,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// The batch stops before its next row once the token is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Fire the progress callback every `size` rows. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Skip rows whose `duration` exceeds `seconds`.
    #[must_use]
    pub fn with_max_duration(mut self, seconds: f64) -> Self {
        self.max_duration = seconds;
        self
    }

    /// The configured duration ceiling in seconds.
    pub fn max_duration(&self) -> f64 {
        self.max_duration
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

/// Shape of the feature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureOptions {
    /// TF-IDF components per text field.
    pub max_features: usize,
    /// Interval closure used for the virality bucket.
    pub bin_closure: BinClosure,
}

impl Default for FeatureOptions {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            bin_closure: BinClosure::Right,
        }
    }
}

impl FeatureOptions {
    /// Create options with defaults (50 components, right-closed bins).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of TF-IDF components per text field.
    #[must_use]
    pub fn max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the virality bin closure.
    #[must_use]
    pub fn bin_closure(mut self, closure: BinClosure) -> Self {
        self.bin_closure = closure;
        self
    }
}
