//! End-to-end scoring scenarios over the public API.

use chrono::Utc;
use tally_core::aggregate::{
    CategoryFilter, EventStatus, compute_standings, recompute_medals, set_placement,
};
use tally_core::model::{
    Category, Event, Grade, GradeId, GradeRef, MedalValues, Position, Snapshot,
};
use tally_core::projection::build_category_view;
use tally_core::store::{FileSource, LoadOrigin, MemorySlot, load};

fn two_grade_snapshot() -> Snapshot {
    let mut snapshot = Snapshot::empty(Utc::now());
    snapshot
        .grades
        .retain(|id, _| matches!(id, GradeId::Grade7 | GradeId::Grade8));
    snapshot
}

#[test]
fn scenario_a_first_and_second_place() {
    let mut snapshot = two_grade_snapshot();
    let mut event = Event::new("Basketball", Category::TeamSports);
    event.set_placement(Position::First, Some(GradeId::Grade7.into()));
    event.set_placement(Position::Second, Some(GradeId::Grade8.into()));
    snapshot.sports.insert("basketball-boys".to_string(), event);

    recompute_medals(&mut snapshot);
    let standings = compute_standings(&snapshot);

    let g7 = &snapshot.grades[&GradeId::Grade7];
    let g8 = &snapshot.grades[&GradeId::Grade8];
    assert_eq!((g7.gold, g7.silver, g7.bronze), (1, 0, 0));
    assert_eq!((g8.gold, g8.silver, g8.bronze), (0, 1, 0));
    assert_eq!(standings[0].grade, GradeId::Grade7);
    assert_eq!(standings[0].total_score, 3);
    assert_eq!(standings[1].grade, GradeId::Grade8);
    assert_eq!(standings[1].total_score, 2);
}

#[test]
fn scenario_b_gold_breaks_score_tie() {
    let mut snapshot = two_grade_snapshot();
    snapshot.medal_values = MedalValues::default();
    // Grade 7: three silvers = 6. Grade 8: two golds = 6.
    snapshot.grades.insert(
        GradeId::Grade7,
        Grade {
            name: "Grade 7".to_string(),
            gold: 0,
            silver: 3,
            bronze: 0,
        },
    );
    snapshot.grades.insert(
        GradeId::Grade8,
        Grade {
            name: "Grade 8".to_string(),
            gold: 2,
            silver: 0,
            bronze: 0,
        },
    );

    let standings = compute_standings(&snapshot);

    assert_eq!(standings[0].total_score, standings[1].total_score);
    assert_eq!(standings[0].grade, GradeId::Grade8);
}

#[test]
fn scenario_c_cleared_event_is_pending() {
    let mut snapshot = Snapshot::empty(Utc::now());
    snapshot
        .sports
        .insert("chess".to_string(), Event::new("Chess", Category::IndividualDualSports));
    set_placement(&mut snapshot, "chess", Position::First, Some(GradeId::Grade9)).unwrap();
    set_placement(&mut snapshot, "chess", Position::Third, Some(GradeId::Grade10)).unwrap();

    for position in Position::ALL {
        set_placement(&mut snapshot, "chess", position, None).unwrap();
    }
    recompute_medals(&mut snapshot);

    assert!(snapshot.grades.values().all(|g| g.total_medals() == 0));
    let view = build_category_view(&snapshot, CategoryFilter::All);
    let card = &view.groups[0].events[0];
    assert_eq!(card.status, EventStatus::Pending);
    assert!(card.podium.is_none());
}

#[test]
fn scenario_d_unknown_grade_contributes_nothing() {
    let mut snapshot = two_grade_snapshot();
    let mut event = Event::new("Futsal", Category::TeamSports);
    event.set_placement(Position::First, Some(GradeRef::from("Grade 11")));
    event.set_placement(Position::Second, Some(GradeId::Grade10.into()));
    event.set_placement(Position::Third, Some(GradeId::Grade8.into()));
    snapshot.sports.insert("futsal".to_string(), event);

    let report = recompute_medals(&mut snapshot);

    assert_eq!(report.counted, 1);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(snapshot.grades[&GradeId::Grade8].bronze, 1);
    assert_eq!(snapshot.grades[&GradeId::Grade7].total_medals(), 0);
}

#[test]
fn scenario_e_cold_start_without_default() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = FileSource::new(dir.path().join("intramurals_data.json"));

    let loaded = load(&MemorySlot::new(), Some(&missing), Utc::now());

    assert_eq!(loaded.origin, LoadOrigin::Fallback);
    let snapshot = loaded.snapshot;
    assert_eq!(
        snapshot.grades.keys().copied().collect::<Vec<_>>(),
        GradeId::ALL.to_vec()
    );
    assert!(snapshot.grades.values().all(|g| g.total_medals() == 0));
    assert!(snapshot.sports.is_empty());
    assert_eq!(snapshot.medal_values, MedalValues::default());
}
