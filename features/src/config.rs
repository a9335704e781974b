//! Extraction configuration.

/// Number of samples taken from the arithmetic intensity curve.
pub const ARITH_INTENSITY_CURVE_SAMPLE_N: usize = 10;

/// Cache line size assumed when the caller doesn't provide one.
pub const DEFAULT_CACHE_LINE_SIZE: i64 = 64;

/// Knobs of the feature extractor.
///
/// `max_n_bufs` fixes the vector schema: the per-buffer section is
/// truncated or zero-padded to exactly this many slots, so vectors from
/// different programs stay comparable.
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Cache line size of the target, in bytes.
    pub cache_line_size: i64,
    /// Number of per-buffer feature slots in the output vector.
    pub max_n_bufs: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self { cache_line_size: DEFAULT_CACHE_LINE_SIZE, max_n_bufs: 5 }
    }
}
