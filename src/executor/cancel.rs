use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// Cooperative cancellation flag. Clones share one flag; the executor
// checks it before launching an external command and between pipeline
// forks. There is no way to revoke a cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
