//! Scoreboard data model.

pub mod event;
pub mod grade;
pub mod snapshot;

pub use event::{Category, Event, GradeRef, PlacementRecord, Position};
pub use grade::{Grade, GradeId, MedalKind, MedalValues, ParseEnumError};
pub use snapshot::{Snapshot, SnapshotError};
