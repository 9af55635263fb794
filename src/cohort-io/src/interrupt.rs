use std::sync::{Arc, atomic::{AtomicBool, Ordering}};

use thiserror::Error;

/// The run was interrupted before completion. Nothing was committed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Interrupted: the run was cancelled before completion")]
pub struct Cancelled;

/// Shared cancellation flag. Long running loops poll it between records or passes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone of this token observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        match self.is_cancelled() {
            true  => Err(Cancelled),
            false => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(Cancelled));
    }

    #[test]
    fn cancel_from_another_thread() {
        let token = CancelToken::new();
        let handle = {
            let token = token.clone();
            std::thread::spawn(move || token.cancel())
        };
        handle.join().expect("thread should not panic");
        assert!(token.is_cancelled());
    }
}
