//! Progress reporting for long running raster operations.

/// Snapshot of the progress of an operation: `completed` out of `total` work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressNotification {
    pub completed: u64,
    pub total: u64,
}

impl ProgressNotification {
    pub fn new(completed: u64, total: u64) -> Self {
        Self { completed, total }
    }

    /// Progress in the range [0, 1], an operation without work is considered finished.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.completed as f64 / self.total as f64).min(1.0)
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

impl std::fmt::Display for ProgressNotification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({:.1}%)", self.completed, self.total, self.fraction() * 100.0)
    }
}

pub type ProgressCallback = Box<dyn FnMut(ProgressNotification) + Send>;

/// Keeps track of the completed work and forwards every update to an optional callback.
pub struct ProgressTracker {
    completed: u64,
    total: u64,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    pub fn new(total: u64, callback: Option<ProgressCallback>) -> Self {
        Self {
            completed: 0,
            total,
            callback,
        }
    }

    pub fn advance(&mut self, count: u64) {
        self.completed = (self.completed + count).min(self.total);
        let notification = ProgressNotification::new(self.completed, self.total);
        log::trace!("Progress: {notification}");
        if let Some(cb) = self.callback.as_mut() {
            cb(notification);
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}
