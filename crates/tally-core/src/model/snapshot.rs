//! The snapshot aggregate: the unit of persistence and replication.
//!
//! # Wire format
//!
//! ```text
//! {
//!   "grades":      { "grade-7": { "name", "gold", "silver", "bronze" }, ... },
//!   "sports":      { "<event-id>": { "name", "category", "subcategory"?,
//!                    "gender"?, "icon", "results": [{ "position", "grade" }] } },
//!   "medalValues": { "gold", "silver", "bronze" },
//!   "lastUpdated": "2025-09-12T08:30:00.000Z"
//! }
//! ```
//!
//! Field names are fixed; the admin page and leaderboard of the previous
//! scoreboard read and write the same document.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::event::Event;
use super::grade::{Grade, GradeId, MedalKind, MedalValues};

/// Errors raised while validating a snapshot at the load boundary.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON for this schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("medal value for {kind} must be positive")]
    NonPositiveMedalValue { kind: MedalKind },

    #[error("snapshot has no grades")]
    NoGrades,
}

/// Full scoreboard state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub grades: BTreeMap<GradeId, Grade>,
    #[serde(default)]
    pub sports: IndexMap<String, Event>,
    #[serde(default)]
    pub medal_values: MedalValues,
    #[serde(default, with = "iso_millis")]
    pub last_updated: DateTime<Utc>,
}

impl Snapshot {
    /// The hard-coded fallback: four zeroed grades, no events, values 3/2/1.
    #[must_use]
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            grades: GradeId::ALL.into_iter().map(|id| (id, Grade::new(id))).collect(),
            sports: IndexMap::new(),
            medal_values: MedalValues::default(),
            last_updated: truncate_millis(now),
        }
    }

    /// Parse and validate a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the document does not match the schema
    /// (including unknown grade keys, categories, or positions) or fails
    /// validation.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let mut snapshot: Self = serde_json::from_str(raw)?;
        snapshot.validate()?;
        snapshot.normalize();
        Ok(snapshot)
    }

    /// Serialize to the pretty-printed wire form.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check invariants the type system cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.grades.is_empty() {
            return Err(SnapshotError::NoGrades);
        }
        for kind in MedalKind::ALL {
            if self.medal_values.value(kind) == 0 {
                return Err(SnapshotError::NonPositiveMedalValue { kind });
            }
        }
        Ok(())
    }

    /// Collapse duplicate placement positions left by hand-edited input.
    fn normalize(&mut self) {
        for (id, event) in &mut self.sports {
            let dropped = event.dedupe_positions();
            if dropped > 0 {
                tracing::warn!(event = %id, dropped, "dropped duplicate placement records");
            }
        }
    }

    /// Strictly-newer comparison used by replication and polling.
    #[must_use]
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.last_updated > other.last_updated
    }

    /// Stamp the snapshot with `now`, keeping stamps strictly increasing
    /// even when the clock has not moved on since the previous stamp.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let now = truncate_millis(now);
        self.last_updated = if now > self.last_updated {
            now
        } else {
            self.last_updated + Duration::milliseconds(1)
        };
    }

    /// Number of events with at least one placement.
    #[must_use]
    pub fn completed_events(&self) -> usize {
        self.sports.values().filter(|e| !e.results.is_empty()).count()
    }
}

fn truncate_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}

/// `lastUpdated` as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// # Errors
    ///
    /// Fails when the value is not an RFC 3339 timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| D::Error::custom(format!("invalid lastUpdated '{raw}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::{Category, Position};
    use chrono::TimeZone;

    const SAMPLE: &str = r#"{
        "grades": {
            "grade-7": { "name": "Grade 7", "gold": 1, "silver": 0, "bronze": 0, "total": 1 },
            "grade-10": { "name": "Grade 10", "gold": 0, "silver": 1, "bronze": 0, "total": 1 }
        },
        "sports": {
            "volleyball-girls": {
                "name": "Volleyball", "category": "Team Sports", "subcategory": "Ball Games",
                "gender": "Girls", "icon": "fas fa-volleyball-ball",
                "results": [{ "position": 1, "grade": "Grade 7" }, { "position": 2, "grade": "Grade 10" }]
            },
            "chess": { "name": "Chess", "category": "Individual Sports", "icon": "fas fa-chess", "results": [] }
        },
        "medalValues": { "gold": 3, "silver": 2, "bronze": 1 },
        "lastUpdated": "2025-09-12T08:30:00.000Z"
    }"#;

    #[test]
    fn parses_original_document() {
        let snapshot = Snapshot::from_json(SAMPLE).unwrap();
        assert_eq!(snapshot.grades.len(), 2);
        assert_eq!(
            snapshot.grades.keys().copied().collect::<Vec<_>>(),
            vec![GradeId::Grade7, GradeId::Grade10]
        );
        assert_eq!(
            snapshot.sports.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["volleyball-girls", "chess"]
        );
        assert_eq!(
            snapshot.sports["chess"].category,
            Category::IndividualDualSports
        );
        assert_eq!(
            snapshot.last_updated,
            Utc.with_ymd_and_hms(2025, 9, 12, 8, 30, 0).unwrap()
        );
        assert_eq!(snapshot.completed_events(), 1);
    }

    #[test]
    fn writes_iso_millis_timestamp() {
        let snapshot = Snapshot::empty(Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["lastUpdated"], "2025-01-02T03:04:05.000Z");
        assert_eq!(json["medalValues"]["gold"], 3);
        assert!(json["grades"]["grade-10"].is_object());
    }

    #[test]
    fn rejects_unknown_grade_key() {
        let raw = SAMPLE.replace("\"grade-10\": {", "\"grade-12\": {");
        assert!(matches!(
            Snapshot::from_json(&raw),
            Err(SnapshotError::Parse(_))
        ));
    }

    #[test]
    fn rejects_zero_medal_value() {
        let raw = SAMPLE.replace("\"bronze\": 1 }", "\"bronze\": 0 }");
        assert!(matches!(
            Snapshot::from_json(&raw),
            Err(SnapshotError::NonPositiveMedalValue {
                kind: MedalKind::Bronze
            })
        ));
    }

    #[test]
    fn rejects_out_of_range_position() {
        let raw = SAMPLE.replace("{ \"position\": 2,", "{ \"position\": 4,");
        assert!(Snapshot::from_json(&raw).is_err());
    }

    #[test]
    fn empty_snapshot_has_four_zeroed_grades() {
        let snapshot = Snapshot::empty(Utc::now());
        assert_eq!(snapshot.grades.len(), 4);
        assert!(snapshot.grades.values().all(|g| g.total_medals() == 0));
        assert!(snapshot.sports.is_empty());
        assert_eq!(snapshot.medal_values, MedalValues::default());
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn touch_is_strictly_increasing() {
        let t0 = Utc.with_ymd_and_hms(2025, 9, 12, 8, 0, 0).unwrap();
        let mut snapshot = Snapshot::empty(t0);
        snapshot.touch(t0);
        assert_eq!(snapshot.last_updated, t0 + Duration::milliseconds(1));

        let later = t0 + Duration::seconds(5);
        snapshot.touch(later);
        assert_eq!(snapshot.last_updated, later);
    }

    #[test]
    fn placement_survives_round_trip() {
        let snapshot = Snapshot::from_json(SAMPLE).unwrap();
        let raw = snapshot.to_json_pretty().unwrap();
        let reparsed = Snapshot::from_json(&raw).unwrap();
        assert_eq!(reparsed, snapshot);
        assert!(reparsed.sports["volleyball-girls"]
            .placement(Position::Second)
            .is_some());
    }
}
