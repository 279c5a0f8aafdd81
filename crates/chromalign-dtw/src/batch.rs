//! Parallel alignment of many recording pairs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rayon::prelude::*;
use tracing::instrument;

use crate::align::{AlignmentConfig, AlignmentResult};
use crate::anchor::Anchor;
use crate::error::AlignError;
use crate::recording::Recording;

/// One alignment task: a recording pair plus its anchors.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentJob<'a> {
    /// The reference recording.
    pub reference: &'a Recording,
    /// The query recording.
    pub query: &'a Recording,
    /// Externally supplied anchors (may be empty).
    pub anchors: &'a [Anchor],
}

/// Results cache keyed by recording-pair identity, scoped to one batch run.
///
/// Repeated alignments of the same pair overwrite the previous entry;
/// writes never interleave. Call [`AlignmentCache::clear`] at batch end.
#[derive(Debug, Default)]
pub struct AlignmentCache {
    inner: Mutex<HashMap<(String, String), Arc<AlignmentResult>>>,
}

impl AlignmentCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result for a pair, if present.
    #[must_use]
    pub fn get(&self, reference_id: &str, query_id: &str) -> Option<Arc<AlignmentResult>> {
        let guard = self.inner.lock().expect("cache mutex poisoned");
        guard
            .get(&(reference_id.to_string(), query_id.to_string()))
            .cloned()
    }

    /// Return the number of cached pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").len()
    }

    /// Return true if the cache holds no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached result.
    pub fn clear(&self) {
        self.inner.lock().expect("cache mutex poisoned").clear();
    }

    fn insert(&self, result: &Arc<AlignmentResult>) {
        let key = (
            result.reference_id().as_str().to_string(),
            result.query_id().as_str().to_string(),
        );
        let mut guard = self.inner.lock().expect("cache mutex poisoned");
        guard.insert(key, Arc::clone(result));
    }
}

/// Align every job in parallel, one rayon task per pair.
///
/// Each alignment is single-threaded internally — the recurrence has a
/// strict cell dependency — so pairs are the concurrency boundary.
/// Successful results are stored in `cache` before being returned; the
/// output order matches the input order.
#[instrument(skip_all, fields(n_jobs = jobs.len()))]
pub fn align_pairs(
    config: &AlignmentConfig,
    jobs: &[AlignmentJob<'_>],
    cache: &AlignmentCache,
) -> Vec<Result<Arc<AlignmentResult>, AlignError>> {
    jobs.par_iter()
        .map(|job| {
            let result = config.align(job.reference, job.query, job.anchors)?;
            let result = Arc::new(result);
            cache.insert(&result);
            Ok(result)
        })
        .collect()
}
