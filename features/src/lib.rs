//! Per-store feature extraction for the learned cost model.
//!
//! The auto-tuner ranks candidate schedules with a regression model. The
//! model never sees the IR: it sees, for every buffer-store statement of
//! the lowered program, a fixed-schema vector of numeric features -- math
//! op counts, loop annotation structure, GPU thread extents, cache-line
//! and reuse behaviour of every touched buffer, and an arithmetic-intensity
//! curve sampled across the loop nest.
//!
//! Extraction is a single recursive walk over the lowered [`skein_ir::Stmt`]
//! tree. The walk maintains the enclosing loop context (nesting, loop kinds,
//! GPU thread axes, unroll pragmas) together with per-loop touched-region
//! tables, and emits one [`FeatureSet`] per store. [`emit`] flattens the
//! sets into dense `f32` vectors with a stable field order; the parallel
//! name vector from [`feature_names`] identifies every slot.
//!
//! # Module Organization
//!
//! - [`mathops`] - Math op counting over a store's value expression
//! - [`access`] - Per-buffer access kinds and index tuples
//! - [`stride`] - Approximate per-variable stride of an access
//! - [`region`] - Touched-region extents under a bound context
//! - [`reuse`] - Data-reuse classification against the loop stack
//! - [`extract`] - The per-store walk itself
//! - [`emit`] - Vector flattening, `slog` transform, feature names
//! - [`batch`] - Parallel extraction over independent records

pub mod access;
pub mod batch;
pub mod config;
pub mod emit;
pub mod error;
pub mod extract;
pub mod mathops;
pub mod region;
pub mod reuse;
pub mod stride;
pub mod types;

#[cfg(test)]
pub mod test;

pub use access::{AccessKind, BufferAccess};
pub use batch::{extract_batch, extract_batch_with};
pub use config::{FeatureConfig, ARITH_INTENSITY_CURVE_SAMPLE_N, DEFAULT_CACHE_LINE_SIZE};
pub use emit::{feature_names, feature_vec_len, slog};
pub use error::{Error, Result};
pub use extract::{per_store_feature_sets, per_store_features};
pub use reuse::ReuseKind;
pub use types::{AnnotationPos, BufferAccessFeature, FeatureSet};
