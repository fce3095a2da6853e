//! Error types for telephony observer operations

use thiserror::Error;

/// Business code reported for a missing permission.
pub const PERMISSION_DENIED: i32 = 201;
/// Business code reported for a malformed event name, slot or callback.
pub const INVALID_PARAMETER: i32 = 8_300_001;
/// Business code reported when the state service cannot be reached.
pub const SERVICE_CONNECTION_FAILED: i32 = 8_300_002;
/// Business code reported for a fault inside the state service.
pub const SYSTEM_INTERNAL_ERROR: i32 = 8_300_003;
/// Business code for anything that does not map to the codes above.
pub const UNKNOWN_ERROR: i32 = 8_300_999;

/// Main error type for observer operations
#[derive(Error, Debug)]
pub enum ObserverError {
    #[error("Permission denied: {permission}")]
    PermissionDenied { permission: String },

    #[error("Invalid parameter value: {reason}")]
    InvalidParameter { reason: String },

    #[error("Operation failed. Cannot connect to service: {reason}")]
    ServiceConnection { reason: String },

    #[error("System internal error: {reason}")]
    SystemInternal { reason: String },

    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl ObserverError {
    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::PermissionDenied {
            permission: permission.into(),
        }
    }

    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    pub fn service_connection(reason: impl Into<String>) -> Self {
        Self::ServiceConnection {
            reason: reason.into(),
        }
    }

    pub fn system_internal(reason: impl Into<String>) -> Self {
        Self::SystemInternal {
            reason: reason.into(),
        }
    }

    /// Platform business code for this error
    pub fn code(&self) -> i32 {
        match self {
            ObserverError::PermissionDenied { .. } => PERMISSION_DENIED,
            ObserverError::InvalidParameter { .. } => INVALID_PARAMETER,
            ObserverError::ServiceConnection { .. } => SERVICE_CONNECTION_FAILED,
            ObserverError::SystemInternal { .. } => SYSTEM_INTERNAL_ERROR,
            _ => UNKNOWN_ERROR,
        }
    }
}

/// Result type alias for observer operations
pub type Result<T> = std::result::Result<T, ObserverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_codes() {
        assert_eq!(ObserverError::permission_denied("ohos.permission.GET_NETWORK_INFO").code(), 201);
        assert_eq!(ObserverError::invalid_parameter("slot").code(), 8_300_001);
        assert_eq!(ObserverError::service_connection("down").code(), 8_300_002);
        assert_eq!(ObserverError::system_internal("oops").code(), 8_300_003);
        assert_eq!(
            ObserverError::Configuration { reason: "bad".to_string() }.code(),
            UNKNOWN_ERROR
        );
    }

    #[test]
    fn test_display() {
        let err = ObserverError::invalid_parameter("unknown event 'foo'");
        assert_eq!(err.to_string(), "Invalid parameter value: unknown event 'foo'");
    }
}
