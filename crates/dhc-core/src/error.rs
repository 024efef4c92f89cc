use thiserror::Error;

/// Failure modes of the remote automation bridge.
///
/// `Unavailable` means no transport exists at all (standalone/demo mode);
/// callers substitute deterministic placeholder data and never surface it.
/// `Call` is a rejected poll or command; the issuing component logs it once
/// at error level and leaves local state untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("remote bridge unavailable")]
    Unavailable,

    #[error("remote call {call} failed: {reason}")]
    Call { call: String, reason: String },
}

impl BridgeError {
    pub fn call(call: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Call {
            call: call.into(),
            reason: reason.into(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}
