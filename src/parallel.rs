//! Ordered fan-out over independent analysis units.
//!
//! Manifest periods and batch probe inputs share nothing, so they can be
//! analyzed on the rayon pool. [`map_ordered`] returns results in input
//! order whatever order the workers finish in, and each unit produces its
//! own result so one failure never aborts its siblings. Without the `rayon`
//! feature, or when parallelism is not requested, it runs sequentially.

use crate::config::AnalysisOptions;

/// Apply `analyze` to every item and collect the results in input order.
pub(crate) fn map_ordered<T, R, F>(items: &[T], options: &AnalysisOptions, analyze: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> R + Sync + Send,
{
    #[cfg(feature = "rayon")]
    if options.runs_parallel() {
        use rayon::prelude::*;

        return items
            .par_iter()
            .enumerate()
            .map(|(index, item)| analyze(index, item))
            .collect();
    }

    #[cfg(not(feature = "rayon"))]
    if options.parallel {
        log::debug!("parallel analysis requested but the `rayon` feature is disabled");
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| analyze(index, item))
        .collect()
}
