use std::sync::{Arc, OnceLock};

use engine_logging::engine_info;
use tokio_util::sync::CancellationToken;

/// Process-wide, one-way stop request.
///
/// Clones share the same flag. The first [`request`](Self::request) wins and
/// its reason is kept; the flag never resets.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: CancellationToken,
    reason: Arc<OnceLock<String>>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if this call flipped the flag.
    pub fn request(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        if self.reason.set(reason.clone()).is_err() {
            return false;
        }
        engine_info!("Stop requested: {}", reason);
        self.token.cancel();
        true
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.get().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::Cancellation;

    #[test]
    fn first_request_wins_and_is_shared() {
        let cancel = Cancellation::new();
        let observer = cancel.clone();
        assert!(!observer.is_requested());

        assert!(cancel.request("SIGINT"));
        assert!(!cancel.request("SIGTERM"));
        assert!(observer.is_requested());
        assert_eq!(observer.reason(), Some("SIGINT"));
    }
}
