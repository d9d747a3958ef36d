use std::fmt;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    UnknownEvent,
    UnknownGrade,
    InvalidEnumValue,
    SnapshotInvalid,
    SlotReadFailed,
    SlotWriteFailed,
    LockContention,
    DefaultFetchFailed,
    ChannelUnavailable,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::UnknownEvent => "E2001",
            Self::UnknownGrade => "E2002",
            Self::InvalidEnumValue => "E2003",
            Self::SnapshotInvalid => "E3001",
            Self::SlotReadFailed => "E5001",
            Self::SlotWriteFailed => "E5002",
            Self::LockContention => "E5003",
            Self::DefaultFetchFailed => "E6001",
            Self::ChannelUnavailable => "E6002",
        }
    }

    /// Short human-facing summary, printed ahead of the specific message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Scoreboard not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownEvent => "Event not found",
            Self::UnknownGrade => "Grade not found",
            Self::InvalidEnumValue => "Invalid grade/position/medal/category value",
            Self::SnapshotInvalid => "Snapshot failed validation",
            Self::SlotReadFailed => "Snapshot read failed",
            Self::SlotWriteFailed => "Snapshot write failed",
            Self::LockContention => "Lock contention",
            Self::DefaultFetchFailed => "Bundled default could not be fetched",
            Self::ChannelUnavailable => "Replication channel unavailable",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `tally init` in this directory."),
            Self::ConfigParseError => Some("Fix syntax in .tally/config.toml and retry."),
            Self::UnknownEvent => Some("Run `tally results` to list event ids."),
            Self::UnknownGrade => Some("Use one of grade-7, grade-8, grade-9, grade-10."),
            Self::InvalidEnumValue => {
                Some("Positions are 1-3; medals are gold, silver, bronze.")
            }
            Self::SnapshotInvalid => {
                Some("Check grade keys, categories and medal values in the snapshot JSON.")
            }
            Self::SlotReadFailed => None,
            Self::SlotWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `tally` process releases its lock."),
            Self::DefaultFetchFailed => Some("Check the `store.seed` path or URL."),
            Self::ChannelUnavailable => {
                Some("Readers fall back to polling; no action needed.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
