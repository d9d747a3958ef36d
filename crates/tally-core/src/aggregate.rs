//! Medal aggregation and ranking.
//!
//! Medal counts are a pure function of the placement records:
//! [`recompute_medals`] zeroes every grade and replays every record, so it
//! is idempotent and conserves medals (one count per filled position).
//! [`compute_standings`] ranks grades by weighted score, breaking ties by
//! gold, then silver, then bronze. A full tie keeps grade order because the
//! sort is stable over the ordered grade map.

use indexmap::IndexMap;
use serde::Serialize;
use std::{cmp::Reverse, fmt, str::FromStr};

use crate::model::event::{ATHLETICS_SUBCATEGORY, Category, Event, GradeRef, Position};
use crate::model::grade::{GradeId, MedalKind, ParseEnumError, normalize};
use crate::model::snapshot::Snapshot;

/// Errors raised by placement mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("unknown grade: {0}")]
    UnknownGrade(GradeId),
}

/// A placement record that did not contribute a medal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPlacement {
    pub event: String,
    pub position: Position,
    pub grade: String,
}

/// Outcome of a recomputation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecomputeReport {
    /// Records that produced a medal.
    pub counted: usize,
    /// Records naming a grade that is unrecognized or absent from the map.
    pub skipped: Vec<SkippedPlacement>,
}

/// Rebuild every grade's medal counts from the placement records.
pub fn recompute_medals(snapshot: &mut Snapshot) -> RecomputeReport {
    for grade in snapshot.grades.values_mut() {
        grade.reset();
    }

    let mut report = RecomputeReport::default();
    for (event_id, event) in &snapshot.sports {
        for record in &event.results {
            let grade = record
                .grade
                .known()
                .and_then(|id| snapshot.grades.get_mut(&id));
            if let Some(grade) = grade {
                *grade.count_mut(record.position.medal()) += 1;
                report.counted += 1;
            } else {
                tracing::debug!(
                    event = %event_id,
                    position = %record.position,
                    grade = record.grade.label(),
                    "skipping placement for unknown grade"
                );
                report.skipped.push(SkippedPlacement {
                    event: event_id.clone(),
                    position: record.position,
                    grade: record.grade.label().to_string(),
                });
            }
        }
    }
    report
}

/// One row of the ranked standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub grade: GradeId,
    pub name: String,
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
    pub total_medals: u32,
    pub total_score: u64,
}

impl Standing {
    const fn sort_key(&self) -> (Reverse<u64>, Reverse<u32>, Reverse<u32>, Reverse<u32>) {
        (
            Reverse(self.total_score),
            Reverse(self.gold),
            Reverse(self.silver),
            Reverse(self.bronze),
        )
    }
}

/// Rank grades by score, then gold, silver, bronze (all descending).
#[must_use]
pub fn compute_standings(snapshot: &Snapshot) -> Vec<Standing> {
    let values = snapshot.medal_values;
    let mut standings: Vec<Standing> = snapshot
        .grades
        .iter()
        .map(|(id, grade)| Standing {
            grade: *id,
            name: grade.name.clone(),
            gold: grade.gold,
            silver: grade.silver,
            bronze: grade.bronze,
            total_medals: grade.total_medals(),
            total_score: values.score(grade),
        })
        .collect();
    standings.sort_by_key(Standing::sort_key);
    standings
}

/// Set or clear the grade at one position of an event, then recompute.
///
/// # Errors
///
/// [`AggregateError::UnknownEvent`] if `event_id` is not in the snapshot and
/// [`AggregateError::UnknownGrade`] if `grade` is not in the grade map.
pub fn set_placement(
    snapshot: &mut Snapshot,
    event_id: &str,
    position: Position,
    grade: Option<GradeId>,
) -> Result<RecomputeReport, AggregateError> {
    if let Some(id) = grade.filter(|id| !snapshot.grades.contains_key(id)) {
        return Err(AggregateError::UnknownGrade(id));
    }
    let event = snapshot
        .sports
        .get_mut(event_id)
        .ok_or_else(|| AggregateError::UnknownEvent(event_id.to_string()))?;
    event.set_placement(position, grade.map(GradeRef::Known));
    Ok(recompute_medals(snapshot))
}

/// Remove every placement from an event, then recompute.
///
/// # Errors
///
/// [`AggregateError::UnknownEvent`] if `event_id` is not in the snapshot.
pub fn clear_placements(
    snapshot: &mut Snapshot,
    event_id: &str,
) -> Result<RecomputeReport, AggregateError> {
    let event = snapshot
        .sports
        .get_mut(event_id)
        .ok_or_else(|| AggregateError::UnknownEvent(event_id.to_string()))?;
    event.results.clear();
    Ok(recompute_medals(snapshot))
}

/// Whether an event has any results yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Completed,
}

impl EventStatus {
    #[must_use]
    pub const fn of(event: &Event) -> Self {
        if event.results.is_empty() {
            Self::Pending
        } else {
            Self::Completed
        }
    }
}

/// Category tab selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryFilter {
    All,
    TeamSports,
    Athletics,
    IndividualDualSports,
    ESports,
    MartialArts,
    CreativeArts,
}

impl CategoryFilter {
    pub const ALL: [Self; 7] = [
        Self::All,
        Self::TeamSports,
        Self::Athletics,
        Self::IndividualDualSports,
        Self::ESports,
        Self::MartialArts,
        Self::CreativeArts,
    ];

    /// Tab identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::TeamSports => "team-sports",
            Self::Athletics => "athletics",
            Self::IndividualDualSports => "individual-dual-sports",
            Self::ESports => "e-sports",
            Self::MartialArts => "martial-arts",
            Self::CreativeArts => "creative-arts",
        }
    }

    /// Whether `event` belongs under this tab.
    ///
    /// Athletics matches on subcategory, and Individual/Dual Sports excludes
    /// the Athletics subcategory; every other tab matches on category.
    #[must_use]
    pub fn matches(self, event: &Event) -> bool {
        let is_athletics = event.subcategory.as_deref() == Some(ATHLETICS_SUBCATEGORY);
        match self {
            Self::All => true,
            Self::Athletics => is_athletics,
            Self::IndividualDualSports => {
                event.category == Category::IndividualDualSports && !is_athletics
            }
            Self::TeamSports => event.category == Category::TeamSports,
            Self::ESports => event.category == Category::ESports,
            Self::MartialArts => event.category == Category::MartialArts,
            Self::CreativeArts => event.category == Category::CreativeArts,
        }
    }

    /// Section heading for the leaderboard.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::All => "Overall Medal Tally",
            Self::TeamSports => "Team Sports Results",
            Self::Athletics => "Athletics Results",
            Self::IndividualDualSports => "Individual/Dual Sports Results",
            Self::ESports => "E-Sports Results",
            Self::MartialArts => "Martial Arts Results",
            Self::CreativeArts => "Creative Arts Results",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::All => "Grades 7-10 Medal Rankings",
            Self::TeamSports => "Basketball, Volleyball, Futsal, Sepak Takraw",
            Self::Athletics => "Track and Field Events",
            Self::IndividualDualSports => "Arnis, Badminton, Table Tennis, Chess, Scrabble",
            Self::ESports => "Mobile Legends, CODM, Tekken 7, Valorant",
            Self::MartialArts => "Arnis, Boxing, Taekwondo, Wrestling",
            Self::CreativeArts => "Banner Art, Banderitas Making Contest",
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "all" => Ok(Self::All),
            "team-sports" => Ok(Self::TeamSports),
            // The leaderboard's tab id for athletics.
            "athletics" | "individual-sports" => Ok(Self::Athletics),
            "individual-dual-sports" => Ok(Self::IndividualDualSports),
            "e-sports" | "esports" => Ok(Self::ESports),
            "martial-arts" => Ok(Self::MartialArts),
            "creative-arts" => Ok(Self::CreativeArts),
            _ => Err(ParseEnumError {
                expected: "category",
                got: s.to_string(),
            }),
        }
    }
}

/// Events grouped by subcategory label, groups in first-seen order.
pub type EventGroups<'a> = IndexMap<String, Vec<(&'a str, &'a Event)>>;

/// Filter events by tab and group them by subcategory (`Other` when absent).
#[must_use]
pub fn group_by_category(snapshot: &Snapshot, filter: CategoryFilter) -> EventGroups<'_> {
    let mut groups: EventGroups<'_> = IndexMap::new();
    for (id, event) in snapshot.sports.iter().filter(|(_, e)| filter.matches(e)) {
        groups
            .entry(event.group_label().to_string())
            .or_default()
            .push((id.as_str(), event));
    }
    groups
}

/// A grade whose stored counts differ from what its placements derive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeDrift {
    pub grade: GradeId,
    pub medal: MedalKind,
    pub stored: u32,
    pub derived: u32,
}

/// Compare stored counts against the placement-derived counts.
///
/// Non-empty only after direct medal edits, which bypass recomputation.
#[must_use]
pub fn find_drift(snapshot: &Snapshot) -> Vec<GradeDrift> {
    let mut derived = snapshot.clone();
    recompute_medals(&mut derived);

    let mut drift = Vec::new();
    for (id, stored) in &snapshot.grades {
        let Some(expected) = derived.grades.get(id) else {
            continue;
        };
        for medal in MedalKind::ALL {
            if stored.count(medal) != expected.count(medal) {
                drift.push(GradeDrift {
                    grade: *id,
                    medal,
                    stored: stored.count(medal),
                    derived: expected.count(medal),
                });
            }
        }
    }
    drift
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::grade::{Grade, MedalValues};
    use chrono::Utc;

    fn snapshot_with(events: &[(&str, Event)]) -> Snapshot {
        let mut snapshot = Snapshot::empty(Utc::now());
        for (id, event) in events {
            snapshot.sports.insert((*id).to_string(), event.clone());
        }
        snapshot
    }

    fn event(name: &str, category: Category, subcategory: Option<&str>) -> Event {
        let mut event = Event::new(name, category);
        event.subcategory = subcategory.map(str::to_string);
        event
    }

    #[test]
    fn recompute_counts_each_position() {
        let mut e = event("Basketball", Category::TeamSports, None);
        e.set_placement(Position::First, Some(GradeId::Grade9.into()));
        e.set_placement(Position::Second, Some(GradeId::Grade7.into()));
        e.set_placement(Position::Third, Some(GradeId::Grade9.into()));
        let mut snapshot = snapshot_with(&[("basketball", e)]);

        let report = recompute_medals(&mut snapshot);

        assert_eq!(report.counted, 3);
        assert!(report.skipped.is_empty());
        let g9 = &snapshot.grades[&GradeId::Grade9];
        assert_eq!((g9.gold, g9.silver, g9.bronze), (1, 0, 1));
        assert_eq!(snapshot.grades[&GradeId::Grade7].silver, 1);
    }

    #[test]
    fn recompute_discards_stale_counts() {
        let mut snapshot = snapshot_with(&[]);
        if let Some(g) = snapshot.grades.get_mut(&GradeId::Grade8) {
            g.gold = 5;
        }
        recompute_medals(&mut snapshot);
        assert_eq!(snapshot.grades[&GradeId::Grade8].gold, 0);
    }

    #[test]
    fn recompute_skips_grade_missing_from_map() {
        let mut e = event("Chess", Category::IndividualDualSports, None);
        e.set_placement(Position::First, Some(GradeId::Grade10.into()));
        let mut snapshot = snapshot_with(&[("chess", e)]);
        snapshot.grades.remove(&GradeId::Grade10);

        let report = recompute_medals(&mut snapshot);

        assert_eq!(report.counted, 0);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].grade, "Grade 10");
    }

    #[test]
    fn standings_break_ties_by_gold_then_silver() {
        let mut snapshot = snapshot_with(&[]);
        snapshot.medal_values = MedalValues::default();
        let set = |s: &mut Snapshot, id: GradeId, g: u32, sv: u32, b: u32| {
            if let Some(grade) = s.grades.get_mut(&id) {
                grade.gold = g;
                grade.silver = sv;
                grade.bronze = b;
            }
        };
        // All score 6.
        set(&mut snapshot, GradeId::Grade7, 0, 3, 0);
        set(&mut snapshot, GradeId::Grade8, 2, 0, 0);
        set(&mut snapshot, GradeId::Grade9, 1, 1, 1);
        set(&mut snapshot, GradeId::Grade10, 0, 0, 6);

        let order: Vec<GradeId> = compute_standings(&snapshot).iter().map(|s| s.grade).collect();

        assert_eq!(
            order,
            vec![GradeId::Grade8, GradeId::Grade9, GradeId::Grade7, GradeId::Grade10]
        );
    }

    #[test]
    fn standings_full_tie_keeps_grade_order() {
        let snapshot = snapshot_with(&[]);
        let order: Vec<GradeId> = compute_standings(&snapshot).iter().map(|s| s.grade).collect();
        assert_eq!(order, GradeId::ALL.to_vec());
    }

    #[test]
    fn standings_of_empty_grade_map_is_empty() {
        let mut snapshot = snapshot_with(&[]);
        snapshot.grades.clear();
        assert!(compute_standings(&snapshot).is_empty());
    }

    #[test]
    fn set_placement_rejects_unknown_event_and_grade() {
        let mut snapshot = snapshot_with(&[("futsal", event("Futsal", Category::TeamSports, None))]);
        assert_eq!(
            set_placement(&mut snapshot, "sepak", Position::First, Some(GradeId::Grade7)),
            Err(AggregateError::UnknownEvent("sepak".to_string()))
        );

        snapshot.grades.remove(&GradeId::Grade7);
        assert_eq!(
            set_placement(&mut snapshot, "futsal", Position::First, Some(GradeId::Grade7)),
            Err(AggregateError::UnknownGrade(GradeId::Grade7))
        );
    }

    #[test]
    fn set_placement_moves_medal_between_grades() {
        let mut snapshot = snapshot_with(&[("futsal", event("Futsal", Category::TeamSports, None))]);
        set_placement(&mut snapshot, "futsal", Position::First, Some(GradeId::Grade7)).unwrap();
        set_placement(&mut snapshot, "futsal", Position::First, Some(GradeId::Grade8)).unwrap();

        assert_eq!(snapshot.grades[&GradeId::Grade7].gold, 0);
        assert_eq!(snapshot.grades[&GradeId::Grade8].gold, 1);
        assert_eq!(snapshot.sports["futsal"].results.len(), 1);
    }

    #[test]
    fn athletics_filter_matches_subcategory() {
        let snapshot = snapshot_with(&[
            ("100m", event("100m Dash", Category::IndividualDualSports, Some("Athletics"))),
            ("badminton", event("Badminton", Category::IndividualDualSports, Some("Racket"))),
            ("relay", event("Relay", Category::TeamSports, Some("Athletics"))),
        ]);

        let athletics = group_by_category(&snapshot, CategoryFilter::Athletics);
        let ids: Vec<&str> = athletics["Athletics"].iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec!["100m", "relay"]);

        let dual = group_by_category(&snapshot, CategoryFilter::IndividualDualSports);
        assert_eq!(dual.len(), 1);
        assert_eq!(dual["Racket"][0].0, "badminton");
    }

    #[test]
    fn groups_keep_insertion_order() {
        let snapshot = snapshot_with(&[
            ("ml", event("Mobile Legends", Category::ESports, Some("MOBA"))),
            ("codm", event("CODM", Category::ESports, None)),
            ("valorant", event("Valorant", Category::ESports, Some("Shooter"))),
            ("dota", event("Dota", Category::ESports, Some("MOBA"))),
        ]);

        let groups = group_by_category(&snapshot, CategoryFilter::ESports);

        assert_eq!(
            groups.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["MOBA", "Other", "Shooter"]
        );
        let moba: Vec<&str> = groups["MOBA"].iter().map(|(id, _)| *id).collect();
        assert_eq!(moba, vec!["ml", "dota"]);
    }

    #[test]
    fn filter_parses_leaderboard_tab_ids() {
        assert_eq!(
            "individual-sports".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Athletics
        );
        for filter in CategoryFilter::ALL {
            assert_eq!(filter.as_str().parse::<CategoryFilter>().unwrap(), filter);
        }
        assert!("chess".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn drift_reports_manual_overrides() {
        let mut e = event("Boxing", Category::MartialArts, None);
        e.set_placement(Position::First, Some(GradeId::Grade7.into()));
        let mut snapshot = snapshot_with(&[("boxing", e)]);
        recompute_medals(&mut snapshot);
        assert!(find_drift(&snapshot).is_empty());

        snapshot.grades.insert(
            GradeId::Grade8,
            Grade {
                name: "Grade 8".to_string(),
                gold: 0,
                silver: 2,
                bronze: 0,
            },
        );
        let drift = find_drift(&snapshot);
        assert_eq!(
            drift,
            vec![GradeDrift {
                grade: GradeId::Grade8,
                medal: MedalKind::Silver,
                stored: 2,
                derived: 0,
            }]
        );
    }

    #[test]
    fn status_tracks_results() {
        let mut e = event("Taekwondo", Category::MartialArts, None);
        assert_eq!(EventStatus::of(&e), EventStatus::Pending);
        e.set_placement(Position::Third, Some(GradeId::Grade9.into()));
        assert_eq!(EventStatus::of(&e), EventStatus::Completed);
    }

    #[test]
    fn standings_survive_extreme_medal_values() {
        let snapshot = Snapshot::from_json(
            r#"{
                "grades": {
                    "grade-7": {"name": "Grade 7", "gold": 4294967295, "silver": 4294967295, "bronze": 4294967295},
                    "grade-8": {"name": "Grade 8", "gold": 4294967295, "silver": 0, "bronze": 0},
                    "grade-9": {"name": "Grade 9", "gold": 0, "silver": 0, "bronze": 1}
                },
                "medalValues": {"gold": 4294967295, "silver": 4294967295, "bronze": 1}
            }"#,
        )
        .unwrap();

        let standings = compute_standings(&snapshot);

        let order: Vec<GradeId> = standings.iter().map(|s| s.grade).collect();
        assert_eq!(order, [GradeId::Grade7, GradeId::Grade8, GradeId::Grade9]);
        assert_eq!(standings[0].total_score, u64::MAX);
        assert_eq!(standings[0].total_medals, u32::MAX);
        assert_eq!(standings[2].total_score, 1);
    }
}
