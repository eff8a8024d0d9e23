use axl_client::{AxlError, ObjectKind};
use thiserror::Error;

/// Provisioning errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: ObjectKind, key: String },

    #[error("{kind} rejected by server: {message}")]
    RemoteRejected { kind: ObjectKind, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unknown device type: {0:?} (expected CSF, TCT, BOT or TAB)")]
    UnknownDeviceType(String),

    #[error("{kind} {key} must exist first")]
    MissingDependency { kind: ObjectKind, key: String },

    #[error("Invalid {kind}: {reason}")]
    Invalid { kind: ObjectKind, reason: String },
}

impl ProvisionError {
    /// Classify a failed add/update/remove.
    pub(crate) fn from_remote(kind: ObjectKind, err: AxlError) -> Self {
        match err {
            AxlError::Fault { message, .. } => ProvisionError::RemoteRejected { kind, message },
            e if e.is_transport() => ProvisionError::Transport(e.to_string()),
            e => ProvisionError::RemoteRejected {
                kind,
                message: e.to_string(),
            },
        }
    }

    pub(crate) fn invalid(kind: ObjectKind, reason: impl Into<String>) -> Self {
        ProvisionError::Invalid {
            kind,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_is_rejection() {
        let err = ProvisionError::from_remote(
            ObjectKind::Phone,
            AxlError::Fault {
                code: Some(4052),
                message: "Device name must be unique".into(),
            },
        );
        assert_eq!(
            err,
            ProvisionError::RemoteRejected {
                kind: ObjectKind::Phone,
                message: "Device name must be unique".into(),
            }
        );
    }

    #[test]
    fn test_transport_classification() {
        let err = ProvisionError::from_remote(ObjectKind::Line, AxlError::Unauthorized);
        assert!(matches!(err, ProvisionError::Transport(_)));

        let err = ProvisionError::from_remote(
            ObjectKind::Line,
            AxlError::UnexpectedResponse("expected uuid".into()),
        );
        assert!(matches!(err, ProvisionError::RemoteRejected { .. }));
    }

    #[test]
    fn test_messages() {
        let err = ProvisionError::AlreadyExists {
            kind: ObjectKind::Line,
            key: "5551212 in Internal PAR".into(),
        };
        assert_eq!(err.to_string(), "Line 5551212 in Internal PAR already exists");
    }
}
