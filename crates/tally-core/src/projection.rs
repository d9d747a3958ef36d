//! Read-only render data for the two scoreboard views.
//!
//! Builders here take `&Snapshot` and never mutate it; the CLI (or any other
//! front end) only formats what they return.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{
    CategoryFilter, EventStatus, GradeDrift, Standing, compute_standings, find_drift,
    group_by_category,
};
use crate::model::event::{Event, Position};
use crate::model::grade::MedalValues;
use crate::model::snapshot::Snapshot;

/// Placeholder for an unfilled podium position.
pub const TBD: &str = "TBD";

/// Marker for the top three rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankBadge {
    Crown,
    Medal,
    Award,
}

impl RankBadge {
    #[must_use]
    pub const fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Self::Crown),
            2 => Some(Self::Medal),
            3 => Some(Self::Award),
            _ => None,
        }
    }

    /// Row class used by the leaderboard styling.
    #[must_use]
    pub const fn place_class(self) -> &'static str {
        match self {
            Self::Crown => "first-place",
            Self::Medal => "second-place",
            Self::Award => "third-place",
        }
    }

    /// Badge name as it appears in JSON output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Crown => "crown",
            Self::Medal => "medal",
            Self::Award => "award",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingsRow {
    /// 1-based position in the sorted list.
    pub rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<RankBadge>,
    #[serde(flatten)]
    pub standing: Standing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingsView {
    pub rows: Vec<StandingsRow>,
    pub medal_values: MedalValues,
    pub last_updated: DateTime<Utc>,
}

/// Overall standings with rank badges for the top three.
#[must_use]
pub fn build_standings_view(snapshot: &Snapshot) -> StandingsView {
    let rows = compute_standings(snapshot)
        .into_iter()
        .enumerate()
        .map(|(index, standing)| StandingsRow {
            rank: index + 1,
            badge: RankBadge::for_rank(index + 1),
            standing,
        })
        .collect();

    StandingsView {
        rows,
        medal_values: snapshot.medal_values,
        last_updated: snapshot.last_updated,
    }
}

/// One podium position on an event card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodiumSlot {
    pub position: Position,
    /// Winning grade label, or [`TBD`] when unfilled.
    pub grade: String,
    pub filled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCard {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub status: EventStatus,
    /// Present only for completed events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub podium: Option<Vec<PodiumSlot>>,
}

impl EventCard {
    fn new(id: &str, event: &Event) -> Self {
        let status = EventStatus::of(event);
        let podium = (status == EventStatus::Completed).then(|| {
            Position::ALL
                .into_iter()
                .map(|position| {
                    event.placement(position).map_or_else(
                        || PodiumSlot {
                            position,
                            grade: TBD.to_string(),
                            filled: false,
                        },
                        |record| PodiumSlot {
                            position,
                            grade: record.grade.label().to_string(),
                            filled: true,
                        },
                    )
                })
                .collect()
        });

        Self {
            id: id.to_string(),
            name: event.display_name(),
            icon: event.icon.clone(),
            status,
            podium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubcategoryGroup {
    pub subcategory: String,
    pub events: Vec<EventCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryView {
    pub filter: CategoryFilter,
    pub title: &'static str,
    pub description: &'static str,
    pub groups: Vec<SubcategoryGroup>,
}

/// Events under one category tab, grouped by subcategory.
#[must_use]
pub fn build_category_view(snapshot: &Snapshot, filter: CategoryFilter) -> CategoryView {
    let groups = group_by_category(snapshot, filter)
        .into_iter()
        .map(|(subcategory, events)| SubcategoryGroup {
            subcategory,
            events: events
                .into_iter()
                .map(|(id, event)| EventCard::new(id, event))
                .collect(),
        })
        .collect();

    CategoryView {
        filter,
        title: filter.title(),
        description: filter.description(),
        groups,
    }
}

/// Headline numbers shown above the tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsView {
    pub total_grades: usize,
    pub total_events: usize,
    pub completed_events: usize,
    pub pending_events: usize,
    pub gold_value: u32,
    pub last_updated: DateTime<Utc>,
    /// Counts edited by hand that no longer match the placements.
    pub manual_overrides: Vec<GradeDrift>,
}

#[must_use]
pub fn build_stats_view(snapshot: &Snapshot) -> StatsView {
    let completed = snapshot.completed_events();
    StatsView {
        total_grades: snapshot.grades.len(),
        total_events: snapshot.sports.len(),
        completed_events: completed,
        pending_events: snapshot.sports.len() - completed,
        gold_value: snapshot.medal_values.gold,
        last_updated: snapshot.last_updated,
        manual_overrides: find_drift(snapshot),
    }
}
