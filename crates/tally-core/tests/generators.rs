#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use tally_core::model::{Category, Event, GradeId, GradeRef, Position, Snapshot};

pub fn arb_grade_id() -> impl Strategy<Value = GradeId> + Clone {
    prop_oneof![
        Just(GradeId::Grade7),
        Just(GradeId::Grade8),
        Just(GradeId::Grade9),
        Just(GradeId::Grade10),
    ]
}

pub fn arb_position() -> impl Strategy<Value = Position> + Clone {
    prop_oneof![
        Just(Position::First),
        Just(Position::Second),
        Just(Position::Third),
    ]
}

pub fn arb_category() -> impl Strategy<Value = Category> + Clone {
    prop_oneof![
        Just(Category::TeamSports),
        Just(Category::Athletics),
        Just(Category::IndividualDualSports),
        Just(Category::ESports),
        Just(Category::MartialArts),
        Just(Category::CreativeArts),
    ]
}

/// A placement grade: mostly known, sometimes a label no grade answers to.
pub fn arb_grade_ref() -> impl Strategy<Value = GradeRef> {
    prop_oneof![
        4 => arb_grade_id().prop_map(GradeRef::Known),
        1 => "[A-Z][a-z]{2,8}".prop_map(GradeRef::Unrecognized),
    ]
}

/// Placement edits applied in order, so later ones replace earlier ones.
pub fn arb_edits<G: Strategy>(grade: G) -> impl Strategy<Value = Vec<(Position, Option<G::Value>)>> {
    prop::collection::vec((arb_position(), prop::option::weighted(0.8, grade)), 0..8)
}

fn build_event(index: usize, category: Category, edits: Vec<(Position, Option<GradeRef>)>) -> Event {
    let mut event = Event::new(format!("Event {index}"), category);
    if index % 3 == 0 {
        event.subcategory = Some("Athletics".to_string());
    }
    for (position, grade) in edits {
        event.set_placement(position, grade);
    }
    event
}

fn build_snapshot(events: Vec<(Category, Vec<(Position, Option<GradeRef>)>)>) -> Snapshot {
    let mut snapshot = Snapshot::empty(Utc.with_ymd_and_hms(2025, 9, 12, 8, 0, 0).unwrap());
    for (index, (category, edits)) in events.into_iter().enumerate() {
        snapshot
            .sports
            .insert(format!("event-{index}"), build_event(index, category, edits));
    }
    snapshot
}

/// Snapshots whose placements only name grades present in the map.
pub fn arb_known_snapshot() -> impl Strategy<Value = Snapshot> {
    let known = arb_grade_id().prop_map(GradeRef::Known);
    prop::collection::vec((arb_category(), arb_edits(known)), 0..12).prop_map(build_snapshot)
}

/// Snapshots that may also carry unrecognized placement grades and stale
/// medal counts.
pub fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
    (
        prop::collection::vec((arb_category(), arb_edits(arb_grade_ref())), 0..12),
        prop::collection::vec((0u32..20, 0u32..20, 0u32..20), 4),
    )
        .prop_map(|(events, stale)| {
            let mut snapshot = build_snapshot(events);
            for (grade, (gold, silver, bronze)) in snapshot.grades.values_mut().zip(stale) {
                grade.gold = gold;
                grade.silver = silver;
                grade.bronze = bronze;
            }
            snapshot
        })
}
