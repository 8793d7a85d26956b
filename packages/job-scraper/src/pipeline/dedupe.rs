//! Order-preserving deduplication.

use std::collections::HashSet;

use crate::types::job::JobRecord;

/// Drop later records whose [`dedupe_key`](JobRecord::dedupe_key) was already seen.
///
/// The first occurrence wins and input order is kept.
pub fn dedupe(jobs: Vec<JobRecord>) -> Vec<JobRecord> {
    let mut seen = HashSet::new();
    jobs.into_iter()
        .filter(|job| seen.insert(job.dedupe_key()))
        .collect()
}
