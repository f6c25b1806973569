//! Cooperative run cancellation

use std::sync::{
    atomic::{ AtomicBool, Ordering },
    Arc,
};

/// A clonable stop flag observed by the measurement loop between commands
///
/// Cancellation is cooperative: raising the flag never interrupts a command
/// already in flight. The sweep engine checks the token at the top of every
/// step and the orchestrator before every pixel, so at most one extra
/// voltage command can go out after a stop request, and the engine's
/// finalization still switches the output off on that path.
#[derive(Clone, Debug, Default)]
pub struct CancelToken
{
    stopped: Arc<AtomicBool>,
}

impl CancelToken
{
    pub fn new() -> Self
    {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request that the active run stop at its next suspension point
    pub fn cancel(&self)
    {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool
    {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused for a later run
    pub fn rearm(&self)
    {
        self.stopped.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests
{
    use super::CancelToken;

    #[test]
    fn clones_share_the_flag()
    {
        let token = CancelToken::new();
        let handle = token.clone();

        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());

        token.rearm();
        assert!(!handle.is_cancelled());
    }
}
