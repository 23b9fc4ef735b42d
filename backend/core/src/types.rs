use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity of an audit entry, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [Self::Debug, Self::Info, Self::Warn, Self::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Status implied by the level when the caller does not set one.
    pub fn default_status(&self) -> LogStatus {
        match self {
            Self::Debug | Self::Info => LogStatus::Success,
            Self::Warn => LogStatus::Warning,
            Self::Error => LogStatus::Error,
        }
    }
}

/// Event taxonomy bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    UserAction,
    ApiCall,
    Navigation,
    Error,
    Performance,
    System,
    Security,
}

impl LogCategory {
    pub const ALL: [LogCategory; 7] = [
        Self::UserAction,
        Self::ApiCall,
        Self::Navigation,
        Self::Error,
        Self::Performance,
        Self::System,
        Self::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserAction => "user_action",
            Self::ApiCall => "api_call",
            Self::Navigation => "navigation",
            Self::Error => "error",
            Self::Performance => "performance",
            Self::System => "system",
            Self::Security => "security",
        }
    }
}

/// Outcome recorded on an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogStatus {
    Success,
    Error,
    Warning,
    InProgress,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::InProgress => "InProgress",
        }
    }

    /// Level used for security events carrying this status.
    pub fn security_level(&self) -> LogLevel {
        match self {
            Self::Error => LogLevel::Error,
            Self::Warning => LogLevel::Warn,
            Self::Success | Self::InProgress => LogLevel::Info,
        }
    }
}

/// Kind of record mutation reported by `log_data_change`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataOperation {
    Create,
    Update,
    Delete,
}

impl DataOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

/// Authentication lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthAction {
    LoginSuccess,
    LoginFailed,
    Logout,
    SessionTimeout,
    PasswordChange,
    AccountLocked,
}

impl AuthAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginSuccess => "login_success",
            Self::LoginFailed => "login_failed",
            Self::Logout => "logout",
            Self::SessionTimeout => "session_timeout",
            Self::PasswordChange => "password_change",
            Self::AccountLocked => "account_locked",
        }
    }

    /// Only a successful login, a logout and a password change count as success.
    pub fn status(&self) -> LogStatus {
        match self {
            Self::LoginSuccess | Self::Logout | Self::PasswordChange => LogStatus::Success,
            Self::LoginFailed | Self::SessionTimeout | Self::AccountLocked => LogStatus::Error,
        }
    }
}

/// Error returned when parsing one of the taxonomy enums from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseTaxonomyError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! impl_str_conversions {
    ($ty:ty, $kind:literal, [$($variant:expr),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseTaxonomyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| ParseTaxonomyError { kind: $kind, value: s.to_string() })
            }
        }
    };
}

impl_str_conversions!(LogLevel, "level", [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error]);
impl_str_conversions!(
    LogCategory,
    "category",
    [
        LogCategory::UserAction,
        LogCategory::ApiCall,
        LogCategory::Navigation,
        LogCategory::Error,
        LogCategory::Performance,
        LogCategory::System,
        LogCategory::Security,
    ]
);
impl_str_conversions!(
    LogStatus,
    "status",
    [LogStatus::Success, LogStatus::Error, LogStatus::Warning, LogStatus::InProgress]
);
impl_str_conversions!(
    DataOperation,
    "operation",
    [DataOperation::Create, DataOperation::Update, DataOperation::Delete]
);
impl_str_conversions!(
    AuthAction,
    "auth action",
    [
        AuthAction::LoginSuccess,
        AuthAction::LoginFailed,
        AuthAction::Logout,
        AuthAction::SessionTimeout,
        AuthAction::PasswordChange,
        AuthAction::AccountLocked,
    ]
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_serialization() {
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"warn\"");
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for category in LogCategory::ALL {
            let parsed: LogCategory = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert_eq!(
            serde_json::to_string(&LogCategory::UserAction).unwrap(),
            "\"user_action\""
        );
    }

    #[test]
    fn test_unknown_value_is_rejected() {
        let err = "verbose".parse::<LogLevel>().unwrap_err();
        assert_eq!(err.kind, "level");
    }

    #[test]
    fn test_default_status_by_level() {
        assert_eq!(LogLevel::Info.default_status(), LogStatus::Success);
        assert_eq!(LogLevel::Debug.default_status(), LogStatus::Success);
        assert_eq!(LogLevel::Warn.default_status(), LogStatus::Warning);
        assert_eq!(LogLevel::Error.default_status(), LogStatus::Error);
    }

    #[test]
    fn test_auth_action_status() {
        assert_eq!(AuthAction::LoginSuccess.status(), LogStatus::Success);
        assert_eq!(AuthAction::Logout.status(), LogStatus::Success);
        assert_eq!(AuthAction::PasswordChange.status(), LogStatus::Success);
        assert_eq!(AuthAction::LoginFailed.status(), LogStatus::Error);
        assert_eq!(AuthAction::SessionTimeout.status(), LogStatus::Error);
        assert_eq!(AuthAction::AccountLocked.status(), LogStatus::Error);
    }

    #[test]
    fn test_security_level_from_status() {
        assert_eq!(LogStatus::Error.security_level(), LogLevel::Error);
        assert_eq!(LogStatus::Warning.security_level(), LogLevel::Warn);
        assert_eq!(LogStatus::Success.security_level(), LogLevel::Info);
    }
}
