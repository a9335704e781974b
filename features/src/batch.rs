//! Batch extraction over independent records.
//!
//! Records share nothing: each walk owns its stacks, region tables and
//! bound analyzer, so a batch fans out across the rayon pool. The only
//! cross-record state is an error counter; a record that fails (in
//! lowering or in extraction) yields an empty vector and the batch carries
//! on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use skein_ir::{OpEffectTable, Stmt};

use crate::config::FeatureConfig;
use crate::error::Result;
use crate::extract::per_store_features;

/// Extract feature vectors for a batch of already-lowered programs.
///
/// Failed records come back as empty vectors; the number of failures is
/// reported once per batch.
pub fn extract_batch(programs: &[Arc<Stmt>], config: &FeatureConfig, effects: &OpEffectTable) -> Vec<Vec<f32>> {
    extract_batch_with(programs, 0, |stmt| Ok(Arc::clone(stmt)), config, effects)
}

/// Extract feature vectors for a batch of records that still need lowering.
///
/// `lower` is the external collaborator turning one record into a lowered
/// statement tree; its failures are folded into the same per-record error
/// policy as extraction failures. The first `skip_first_n` records are not
/// extracted and come back as empty vectors.
pub fn extract_batch_with<T, F>(
    records: &[T],
    skip_first_n: usize,
    lower: F,
    config: &FeatureConfig,
    effects: &OpEffectTable,
) -> Vec<Vec<f32>>
where
    T: Sync,
    F: Fn(&T) -> Result<Arc<Stmt>> + Sync,
{
    let error_ct = AtomicUsize::new(0);

    let features: Vec<Vec<f32>> = records
        .par_iter()
        .enumerate()
        .map(|(i, record)| {
            if i < skip_first_n {
                return Vec::new();
            }
            match lower(record).and_then(|stmt| per_store_features(&stmt, config, effects)) {
                Ok(vec) => vec,
                Err(error) => {
                    error_ct.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(record = i, error = %error, "feature extraction failed for record");
                    Vec::new()
                }
            }
        })
        .collect();

    let errors = error_ct.into_inner();
    if errors > 0 {
        tracing::warn!(errors, "encountered errors during feature extraction; the records were safely ignored");
    }

    features
}
