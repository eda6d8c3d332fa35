//! Decomposition options.
//!
//! [`DecompositionOptions`] collects the algorithm-independent knobs of a
//! decomposition run. Build it with [`DecompositionOptionsBuilder`] or start
//! from [`Default`] and override fields.
//!
//! The rayon cutoff for parallel subtree construction defaults to
//! [`DEFAULT_PARALLEL_THRESHOLD`] and can be overridden process-wide through the
//! `DOMAIN_DECOMP_PARALLEL_THRESHOLD` environment variable.

use crate::core::dispatch::Algorithm;

/// Default maximum number of points per leaf.
pub const DEFAULT_LEAFSIZE: usize = 10_000;

/// Subtrees with more points than this are split across rayon workers.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4_096;

/// Environment variable overriding [`DEFAULT_PARALLEL_THRESHOLD`].
pub const PARALLEL_THRESHOLD_ENV: &str = "DOMAIN_DECOMP_PARALLEL_THRESHOLD";

/// Returns the parallel threshold, honoring `DOMAIN_DECOMP_PARALLEL_THRESHOLD`.
///
/// Unparseable values fall back to [`DEFAULT_PARALLEL_THRESHOLD`].
#[must_use]
pub fn default_parallel_threshold() -> usize {
    if let Ok(v) = std::env::var(PARALLEL_THRESHOLD_ENV)
        && let Ok(n) = v.trim().parse::<usize>()
    {
        return n;
    }
    DEFAULT_PARALLEL_THRESHOLD
}

/// Options controlling one decomposition run.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::core::config::DecompositionOptionsBuilder;
/// use domain_decomp::core::dispatch::Algorithm;
///
/// let options = DecompositionOptionsBuilder::default()
///     .leafsize(64)
///     .compute_neighbors(false)
///     .build()
///     .unwrap();
/// assert_eq!(options.algorithm, Algorithm::KdTree);
/// assert_eq!(options.leafsize, 64);
///
/// // A zero leafsize never yields a valid partition.
/// assert!(DecompositionOptionsBuilder::default().leafsize(0).build().is_err());
/// ```
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct DecompositionOptions {
    /// Partitioning strategy.
    #[builder(default)]
    pub algorithm: Algorithm,

    /// Maximum number of points per leaf.
    #[builder(default = "DEFAULT_LEAFSIZE")]
    pub leafsize: usize,

    /// Annotate leaves with (non-periodic) neighbor sets even when no axis is periodic.
    #[builder(default = "true")]
    pub compute_neighbors: bool,

    /// Subtree size above which construction forks onto the rayon pool.
    #[builder(default = "default_parallel_threshold()")]
    pub parallel_threshold: usize,
}

impl DecompositionOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.leafsize == Some(0) {
            return Err("leafsize must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for DecompositionOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            leafsize: DEFAULT_LEAFSIZE,
            compute_neighbors: true,
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl DecompositionOptions {
    /// Default options with the given `leafsize`.
    #[must_use]
    pub fn with_leafsize(leafsize: usize) -> Self {
        Self {
            leafsize,
            ..Self::default()
        }
    }
}
