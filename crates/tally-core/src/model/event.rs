use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

use super::grade::{GradeId, MedalKind, ParseEnumError, normalize};

/// Subcategory label that the Athletics filter matches on.
pub const ATHLETICS_SUBCATEGORY: &str = "Athletics";

/// Group label for events without a subcategory.
pub const DEFAULT_SUBCATEGORY: &str = "Other";

/// Sport categories. Closed set, validated when a snapshot is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Team Sports")]
    TeamSports,
    #[serde(rename = "Athletics")]
    Athletics,
    #[serde(rename = "Individual/Dual Sports", alias = "Individual Sports")]
    IndividualDualSports,
    #[serde(rename = "E-Sports")]
    ESports,
    #[serde(rename = "Martial Arts")]
    MartialArts,
    #[serde(rename = "Creative Arts")]
    CreativeArts,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TeamSports => "Team Sports",
            Self::Athletics => "Athletics",
            Self::IndividualDualSports => "Individual/Dual Sports",
            Self::ESports => "E-Sports",
            Self::MartialArts => "Martial Arts",
            Self::CreativeArts => "Creative Arts",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Podium position: 1 gold, 2 silver, 3 bronze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Position {
    First,
    Second,
    Third,
}

impl Position {
    pub const ALL: [Self; 3] = [Self::First, Self::Second, Self::Third];

    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }

    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            _ => None,
        }
    }

    #[must_use]
    pub const fn medal(self) -> MedalKind {
        match self {
            Self::First => MedalKind::Gold,
            Self::Second => MedalKind::Silver,
            Self::Third => MedalKind::Bronze,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl FromStr for Position {
    type Err = ParseEnumError;

    /// Accepts `1`/`2`/`3` or the medal name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        let by_number = normalized.parse::<u8>().ok().and_then(Self::from_number);
        let by_medal = match normalized.as_str() {
            "gold" | "1st" => Some(Self::First),
            "silver" | "2nd" => Some(Self::Second),
            "bronze" | "3rd" => Some(Self::Third),
            _ => None,
        };
        by_number.or(by_medal).ok_or_else(|| ParseEnumError {
            expected: "position",
            got: s.to_string(),
        })
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = u8::deserialize(deserializer)?;
        Self::from_number(n).ok_or_else(|| {
            serde::de::Error::custom(format!("placement position must be 1, 2 or 3, got {n}"))
        })
    }
}

/// The grade named by a placement record.
///
/// Records are kept even when the name does not resolve, so that a snapshot
/// written by a newer or hand-edited source still loads; aggregation skips
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GradeRef {
    Known(GradeId),
    Unrecognized(String),
}

impl GradeRef {
    #[must_use]
    pub const fn known(&self) -> Option<GradeId> {
        match self {
            Self::Known(id) => Some(*id),
            Self::Unrecognized(_) => None,
        }
    }

    /// Text shown on an event card for this placement.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Known(id) => id.display_name(),
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl From<GradeId> for GradeRef {
    fn from(id: GradeId) -> Self {
        Self::Known(id)
    }
}

impl From<&str> for GradeRef {
    fn from(raw: &str) -> Self {
        raw.parse::<GradeId>()
            .map_or_else(|_| Self::Unrecognized(raw.to_string()), Self::Known)
    }
}

// Placement grades are stored as the display label ("Grade 7").
impl Serialize for GradeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for GradeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// One finishing position and the grade that took it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub position: Position,
    pub grade: GradeRef,
}

/// A contested event ("sport" in the UI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub results: Vec<PlacementRecord>,
}

impl Event {
    #[must_use]
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            subcategory: None,
            gender: None,
            icon: String::new(),
            results: Vec::new(),
        }
    }

    /// Name with a gender qualifier, e.g. `Basketball (Boys)`; `Mixed` is
    /// left off.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.gender.as_deref() {
            Some(gender) if !gender.is_empty() && gender != "Mixed" => {
                format!("{} ({gender})", self.name)
            }
            _ => self.name.clone(),
        }
    }

    /// Subcategory used for grouping.
    #[must_use]
    pub fn group_label(&self) -> &str {
        self.subcategory
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SUBCATEGORY)
    }

    #[must_use]
    pub fn placement(&self, position: Position) -> Option<&PlacementRecord> {
        self.results.iter().find(|r| r.position == position)
    }

    /// Replace the record at `position`; `None` leaves it unfilled.
    pub fn set_placement(&mut self, position: Position, grade: Option<GradeRef>) {
        self.results.retain(|r| r.position != position);
        if let Some(grade) = grade {
            self.results.push(PlacementRecord { position, grade });
        }
    }

    /// Drop all but the last record for each position, returning how many
    /// were removed. Only hand-edited input can hold duplicates.
    pub fn dedupe_positions(&mut self) -> usize {
        let before = self.results.len();
        let mut seen = Vec::with_capacity(Position::ALL.len());
        let mut kept: Vec<PlacementRecord> = Vec::with_capacity(before);
        for record in self.results.drain(..).rev() {
            if !seen.contains(&record.position) {
                seen.push(record.position);
                kept.push(record);
            }
        }
        kept.reverse();
        self.results = kept;
        before - self.results.len()
    }
}
