use std::sync::Mutex;

#[derive(Debug, Default)]
struct Batch {
    done: Vec<bool>,
    completed: usize,
}

/// Aggregates per-file completion into an overall percentage.
///
/// The completed count only grows within a batch and is reset by
/// [`UploadTracker::start_batch`]. Marking the same file twice counts once.
#[derive(Debug, Default)]
pub struct UploadTracker {
    batch: Mutex<Batch>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a batch of `total` files.
    pub fn start_batch(&self, total: usize) {
        let mut batch = self.batch.lock().unwrap_or_else(|e| e.into_inner());
        *batch = Batch {
            done: vec![false; total],
            completed: 0,
        };
    }

    /// Begin a batch of `total` files unless one is still outstanding.
    ///
    /// Returns `false` and leaves the running batch alone in that case.
    pub fn try_start_batch(&self, total: usize) -> bool {
        let mut batch = self.batch.lock().unwrap_or_else(|e| e.into_inner());
        if batch.completed < batch.done.len() {
            return false;
        }
        *batch = Batch {
            done: vec![false; total],
            completed: 0,
        };
        true
    }

    /// Record that file `index` finished. Returns the new percentage.
    pub fn mark_complete(&self, index: usize) -> f64 {
        let mut batch = self.batch.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(done) = batch.done.get_mut(index) {
            if !*done {
                *done = true;
                batch.completed += 1;
            }
        }
        percentage(batch.completed, batch.done.len())
    }

    pub fn progress(&self) -> f64 {
        let batch = self.batch.lock().unwrap_or_else(|e| e.into_inner());
        percentage(batch.completed, batch.done.len())
    }

    pub fn completed(&self) -> usize {
        self.batch.lock().unwrap_or_else(|e| e.into_inner()).completed
    }

    pub fn total(&self) -> usize {
        self.batch.lock().unwrap_or_else(|e| e.into_inner()).done.len()
    }

    /// True while some file of the current batch is still outstanding.
    pub fn is_uploading(&self) -> bool {
        let batch = self.batch.lock().unwrap_or_else(|e| e.into_inner());
        batch.completed < batch.done.len()
    }

    /// True once a non-empty batch has fully completed.
    pub fn is_finished(&self) -> bool {
        let batch = self.batch.lock().unwrap_or_else(|e| e.into_inner());
        !batch.done.is_empty() && batch.completed == batch.done.len()
    }
}

fn percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}
