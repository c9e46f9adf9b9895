//! Error taxonomy shared by the control plane and the client.
//!
//! Every variant carries a stable machine-readable code ([`BeaconError::code`])
//! used in HTTP error bodies and mapped back onto the taxonomy by the client.
//! Registry errors are surfaced verbatim to the caller and never retried;
//! nothing here is process-fatal.

use thiserror::Error;

/// Errors in the Beacon domain.
#[derive(Debug, Error)]
pub enum BeaconError {
    /// A required field was missing or empty.
    #[error("missing or invalid field: {0}")]
    InvalidInput(String),

    /// An endpoint tried to add itself as a contact.
    #[error("cannot add yourself as a contact")]
    SelfLinkRejected,

    /// The owner side of a contact link is not a registered identity.
    #[error("owner {0} is not registered")]
    OwnerNotFound(String),

    /// The target of a contact link is not a registered identity.
    #[error("peer {0} is not registered")]
    TargetNotFound(String),

    /// Credential missing, unknown, or inactive. Denial is total.
    #[error("access denied: invalid api key")]
    AccessDenied,

    /// Transport-level channel open or send failure.
    #[error("channel error: {0}")]
    Channel(String),

    /// The locally persisted identity is no longer recognized by the
    /// control plane. Triggers a full local-identity reset.
    #[error("identity {0} is no longer registered")]
    StaleIdentity(String),
}

impl BeaconError {
    /// Stable wire code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::SelfLinkRejected => "SELF_LINK_REJECTED",
            Self::OwnerNotFound(_) => "OWNER_NOT_FOUND",
            Self::TargetNotFound(_) => "TARGET_NOT_FOUND",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::Channel(_) => "CHANNEL_ERROR",
            Self::StaleIdentity(_) => "STALE_IDENTITY",
        }
    }

    /// Rebuild a taxonomy error from a wire code and message.
    ///
    /// Used by the client to map `{error, code}` HTTP bodies back onto
    /// typed errors. Unknown codes return `None`; the caller decides how
    /// to report them.
    #[must_use]
    pub fn from_code(code: &str, message: &str) -> Option<Self> {
        match code {
            "INVALID_INPUT" => Some(Self::InvalidInput(message.to_owned())),
            "SELF_LINK_REJECTED" => Some(Self::SelfLinkRejected),
            "OWNER_NOT_FOUND" => Some(Self::OwnerNotFound(message.to_owned())),
            "TARGET_NOT_FOUND" => Some(Self::TargetNotFound(message.to_owned())),
            "ACCESS_DENIED" => Some(Self::AccessDenied),
            "CHANNEL_ERROR" => Some(Self::Channel(message.to_owned())),
            "STALE_IDENTITY" => Some(Self::StaleIdentity(message.to_owned())),
            _ => None,
        }
    }
}

/// Convenience alias for results in the Beacon domain.
pub type Result<T> = std::result::Result<T, BeaconError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(BeaconError::InvalidInput("x".into()).code(), "INVALID_INPUT");
        assert_eq!(BeaconError::SelfLinkRejected.code(), "SELF_LINK_REJECTED");
        assert_eq!(
            BeaconError::OwnerNotFound("A".into()).code(),
            "OWNER_NOT_FOUND"
        );
        assert_eq!(
            BeaconError::TargetNotFound("B".into()).code(),
            "TARGET_NOT_FOUND"
        );
        assert_eq!(BeaconError::AccessDenied.code(), "ACCESS_DENIED");
        assert_eq!(BeaconError::Channel("boom".into()).code(), "CHANNEL_ERROR");
        assert_eq!(
            BeaconError::StaleIdentity("AB12CD".into()).code(),
            "STALE_IDENTITY"
        );
    }

    #[test]
    fn from_code_roundtrips() {
        for err in [
            BeaconError::InvalidInput("friendId".into()),
            BeaconError::SelfLinkRejected,
            BeaconError::OwnerNotFound("AB12CD".into()),
            BeaconError::TargetNotFound("QQ00QQ".into()),
            BeaconError::AccessDenied,
            BeaconError::Channel("peer offline".into()),
            BeaconError::StaleIdentity("AB12CD".into()),
        ] {
            let back = BeaconError::from_code(err.code(), "msg").unwrap();
            assert_eq!(back.code(), err.code());
        }
    }

    #[test]
    fn from_code_rejects_unknown() {
        assert!(BeaconError::from_code("NOT_A_CODE", "msg").is_none());
    }

    #[test]
    fn display_messages() {
        let err = BeaconError::TargetNotFound("QQ00QQ".into());
        assert_eq!(err.to_string(), "peer QQ00QQ is not registered");
        assert_eq!(
            BeaconError::SelfLinkRejected.to_string(),
            "cannot add yourself as a contact"
        );
    }

    #[test]
    fn is_std_error() {
        let err = BeaconError::AccessDenied;
        let _: &dyn std::error::Error = &err;
    }
}
