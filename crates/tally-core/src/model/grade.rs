use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The four competing grade levels.
///
/// Ordering is numeric, so a `BTreeMap<GradeId, _>` iterates 7, 8, 9, 10
/// rather than the lexicographic `grade-10` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GradeId {
    #[serde(rename = "grade-7")]
    Grade7,
    #[serde(rename = "grade-8")]
    Grade8,
    #[serde(rename = "grade-9")]
    Grade9,
    #[serde(rename = "grade-10")]
    Grade10,
}

impl GradeId {
    pub const ALL: [Self; 4] = [Self::Grade7, Self::Grade8, Self::Grade9, Self::Grade10];

    /// Stable key used in the persisted `grades` map.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Grade7 => "grade-7",
            Self::Grade8 => "grade-8",
            Self::Grade9 => "grade-9",
            Self::Grade10 => "grade-10",
        }
    }

    /// Label shown in the UI and stored in placement records.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Grade7 => "Grade 7",
            Self::Grade8 => "Grade 8",
            Self::Grade9 => "Grade 9",
            Self::Grade10 => "Grade 10",
        }
    }

    const fn number(self) -> u8 {
        match self {
            Self::Grade7 => 7,
            Self::Grade8 => 8,
            Self::Grade9 => 9,
            Self::Grade10 => 10,
        }
    }
}

impl fmt::Display for GradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

pub(crate) fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for GradeId {
    type Err = ParseEnumError;

    /// Accepts `grade-7`, `Grade 7`, or a bare `7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        let number = normalized
            .strip_prefix("grade-")
            .or_else(|| normalized.strip_prefix("grade "))
            .unwrap_or(normalized.as_str())
            .trim();

        Self::ALL
            .into_iter()
            .find(|grade| number.parse::<u8>().ok() == Some(grade.number()))
            .ok_or_else(|| ParseEnumError {
                expected: "grade",
                got: s.to_string(),
            })
    }
}

/// Medal kinds, in podium order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedalKind {
    Gold,
    Silver,
    Bronze,
}

impl MedalKind {
    pub const ALL: [Self; 3] = [Self::Gold, Self::Silver, Self::Bronze];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::Bronze => "bronze",
        }
    }
}

impl fmt::Display for MedalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MedalKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "gold" => Ok(Self::Gold),
            "silver" => Ok(Self::Silver),
            "bronze" => Ok(Self::Bronze),
            _ => Err(ParseEnumError {
                expected: "medal kind",
                got: s.to_string(),
            }),
        }
    }
}

/// One grade level and its medal tally.
///
/// Counts are normally derived from placement records; see
/// [`crate::aggregate::recompute_medals`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub name: String,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub silver: u32,
    #[serde(default)]
    pub bronze: u32,
}

impl Grade {
    /// A zeroed grade with its canonical display name.
    #[must_use]
    pub fn new(id: GradeId) -> Self {
        Self {
            name: id.display_name().to_string(),
            gold: 0,
            silver: 0,
            bronze: 0,
        }
    }

    #[must_use]
    pub const fn count(&self, kind: MedalKind) -> u32 {
        match kind {
            MedalKind::Gold => self.gold,
            MedalKind::Silver => self.silver,
            MedalKind::Bronze => self.bronze,
        }
    }

    pub const fn count_mut(&mut self, kind: MedalKind) -> &mut u32 {
        match kind {
            MedalKind::Gold => &mut self.gold,
            MedalKind::Silver => &mut self.silver,
            MedalKind::Bronze => &mut self.bronze,
        }
    }

    pub const fn reset(&mut self) {
        self.gold = 0;
        self.silver = 0;
        self.bronze = 0;
    }

    #[must_use]
    pub const fn total_medals(&self) -> u32 {
        self.gold.saturating_add(self.silver).saturating_add(self.bronze)
    }
}

/// Point weight per medal kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalValues {
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
}

impl Default for MedalValues {
    fn default() -> Self {
        Self {
            gold: 3,
            silver: 2,
            bronze: 1,
        }
    }
}

impl MedalValues {
    #[must_use]
    pub const fn value(&self, kind: MedalKind) -> u32 {
        match kind {
            MedalKind::Gold => self.gold,
            MedalKind::Silver => self.silver,
            MedalKind::Bronze => self.bronze,
        }
    }

    /// Weighted score for a grade's tally. Saturates at `u64::MAX`.
    #[must_use]
    pub fn score(&self, grade: &Grade) -> u64 {
        MedalKind::ALL
            .into_iter()
            .map(|kind| u64::from(grade.count(kind)).saturating_mul(u64::from(self.value(kind))))
            .fold(0, u64::saturating_add)
    }
}

/// Coerce free-form medal count input to a count.
///
/// Mirrors lenient numeric form fields: the leading integer is taken
/// (`"4 medals"` is 4, `"2.9"` is 2); empty, non-numeric, and negative
/// input become 0.
#[must_use]
pub fn coerce_count(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if negative || end == 0 {
        return 0;
    }
    digits[..end].parse::<u32>().unwrap_or(u32::MAX)
}
