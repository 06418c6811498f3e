use std::thread;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::Result;

/// Number of workers to use: `requested`, or available parallelism when zero.
pub fn worker_count(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    thread::available_parallelism().map_or(1, |n| n.get())
}

/// Build the bounded pool the concurrent strategies dispatch onto.
pub fn build_pool(requested: usize) -> Result<ThreadPool> {
    let workers = worker_count(requested);
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("zipbench-worker-{i}"))
        .build()?;
    tracing::debug!(workers, "worker pool ready");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_worker_count_wins() {
        assert_eq!(worker_count(3), 3);
        assert!(worker_count(0) >= 1);
    }

    #[test]
    fn pool_has_requested_size() {
        let pool = build_pool(2).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
    }
}
