use crate::output::CliError;
use tally_core::aggregate::CategoryFilter;
use tally_core::error::ErrorCode;
use tally_core::model::{GradeId, MedalKind, Position};

pub const MAX_EVENT_ID_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
    pub suggestion: String,
}

impl ValidationError {
    pub fn new(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn to_cli_error(&self) -> CliError {
        CliError {
            suggestion: Some(self.suggestion.clone()),
            ..CliError::with_code(
                format!("invalid {} '{}': {}", self.field, self.value, self.reason),
                ErrorCode::InvalidEnumValue,
            )
        }
    }
}

pub fn validate_event_id(s: &str) -> Result<(), ValidationError> {
    if s.trim().is_empty() {
        return Err(ValidationError::new(
            "event",
            s,
            "must not be empty",
            "run `tally results` to list event ids",
        ));
    }
    if s.chars().count() > MAX_EVENT_ID_LEN {
        return Err(ValidationError::new(
            "event",
            s,
            format!("must be <= {MAX_EVENT_ID_LEN} characters"),
            "run `tally results` to list event ids",
        ));
    }
    if s.chars().any(char::is_control) {
        return Err(ValidationError::new(
            "event",
            s,
            "must not contain control characters",
            "run `tally results` to list event ids",
        ));
    }
    Ok(())
}

pub fn validate_grade(s: &str) -> Result<GradeId, ValidationError> {
    s.parse().map_err(|_| {
        ValidationError::new(
            "grade",
            s,
            "expected one of grade-7, grade-8, grade-9, grade-10",
            "use grade-7, \"Grade 7\", or just 7",
        )
    })
}

pub fn validate_position(s: &str) -> Result<Position, ValidationError> {
    s.parse().map_err(|_| {
        ValidationError::new(
            "position",
            s,
            "expected 1, 2, or 3",
            "use 1 (gold), 2 (silver), or 3 (bronze)",
        )
    })
}

pub fn validate_medal(s: &str) -> Result<MedalKind, ValidationError> {
    s.parse().map_err(|_| {
        ValidationError::new(
            "medal",
            s,
            "expected one of gold, silver, bronze",
            "use gold|silver|bronze",
        )
    })
}

pub fn validate_filter(s: &str) -> Result<CategoryFilter, ValidationError> {
    s.parse().map_err(|_| {
        let ids: Vec<&str> = CategoryFilter::ALL.iter().map(|f| f.as_str()).collect();
        ValidationError::new(
            "category",
            s,
            format!("expected one of {}", ids.join(", ")),
            "use a tab id such as team-sports or athletics",
        )
    })
}
