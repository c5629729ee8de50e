use std::any::Any;

/// Failures produced by the promise machinery itself.
///
/// User error types take part in a chain by implementing `From<Error>`, so
/// that a panicking executor or a failed task submission can still be
/// reported through the promise's own error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An executor or callback panicked. Carries the panic message when the
    /// payload is a `&str` or `String`, and the text `Box<dyn Any>` for any
    /// other payload. A payload that is itself an [`Error`] is returned as is
    /// rather than wrapped here.
    #[error("promise work panicked: {0}")]
    Panicked(String),
    /// The executor refused or failed to start a task.
    #[error("failed to schedule promise work: {0}")]
    Schedule(String),
    /// The executor has been shut down.
    #[error("executor has shut down")]
    Shutdown,
    /// A promise was resolved with itself.
    #[error("a promise cannot adopt itself")]
    SelfResolution,
    /// A plain rejection reason.
    #[error("{0}")]
    Rejected(String),
}

impl Error {
    /// Rejection reason built from a message.
    pub fn msg(reason: impl Into<String>) -> Self {
        Error::Rejected(reason.into())
    }

    /// Converts a payload caught by `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<Error>() {
            Ok(err) => {
                log::warn!("converted panic into rejection: {}", err);
                return *err;
            }
            Err(payload) => payload,
        };
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_owned()
        };
        log::warn!("converted panic into rejection: {}", message);
        Error::Panicked(message)
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Error::Panicked(_))
    }
}
