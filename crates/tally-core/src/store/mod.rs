//! Snapshot ownership, persistence, and replication.
//!
//! A [`Store`] owns the current [`Snapshot`]. Admin-side mutations end in
//! [`Store::commit`], which stamps the snapshot, writes it durably, and then
//! broadcasts it. Leaderboard-side readers call [`Store::sync`] on a timer and
//! adopt any snapshot strictly newer than their own.
//!
//! ```text
//! mutate ─► commit ─► slot.write(DATA_KEY) ─► channel.publish
//!                                              └─(fails)─► slot.write(TRIGGER_KEY)
//!
//! sync ─► drain channel ─► read TRIGGER_KEY ─► read DATA_KEY ─► adopt newest
//! ```

pub mod channel;
pub mod slot;
pub mod source;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::mpsc::{Receiver, TryRecvError};

use crate::aggregate::{self, AggregateError};
use crate::error::ErrorCode;
use crate::model::grade::{GradeId, MedalKind, coerce_count};
use crate::model::event::Position;
use crate::model::snapshot::Snapshot;

pub use channel::{Channel, ChannelError, ChannelMessage, LocalBus, Unavailable};
pub use slot::{DATA_KEY, FileSlot, MemorySlot, Slot, SlotError, TRIGGER_KEY};
pub use source::{DefaultSource, FileSource, LoadError};

/// Which step of the bootstrap chain produced the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadOrigin {
    /// The durable slot.
    Slot,
    /// The bundled default resource.
    Bundled,
    /// The hard-coded empty snapshot.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub snapshot: Snapshot,
    pub origin: LoadOrigin,
}

/// Read the snapshot stored in `slot`.
///
/// # Errors
///
/// [`LoadError::Missing`] when nothing is stored, or the slot/validation
/// failure otherwise.
pub fn read_slot(slot: &dyn Slot) -> Result<Snapshot, LoadError> {
    let raw = slot.read(DATA_KEY)?.ok_or(LoadError::Missing)?;
    Ok(Snapshot::from_json(&raw)?)
}

/// Bootstrap: slot, then bundled default, then the empty snapshot.
///
/// Never fails; each miss is logged and the next step tried.
pub fn load(slot: &dyn Slot, source: Option<&dyn DefaultSource>, now: DateTime<Utc>) -> Loaded {
    match read_slot(slot) {
        Ok(snapshot) => {
            return Loaded {
                snapshot,
                origin: LoadOrigin::Slot,
            };
        }
        Err(LoadError::Missing) => tracing::debug!("slot empty, trying bundled default"),
        Err(err) => tracing::warn!(code = %err.code(), "stored snapshot unusable: {err}"),
    }

    if let Some(source) = source {
        match source.fetch() {
            Ok(snapshot) => {
                tracing::info!(source = %source.describe(), "loaded bundled default");
                return Loaded {
                    snapshot,
                    origin: LoadOrigin::Bundled,
                };
            }
            Err(err) => tracing::warn!(
                code = %err.code(),
                source = %source.describe(),
                "bundled default unusable: {err}"
            ),
        }
    }

    tracing::info!("starting from empty scoreboard");
    Loaded {
        snapshot: Snapshot::empty(now),
        origin: LoadOrigin::Fallback,
    }
}

/// Errors from admin mutations. Storage and replication failures are not
/// errors here; they are reported through [`CommitReport`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Aggregate(AggregateError::UnknownEvent(_)) => ErrorCode::UnknownEvent,
            Self::Aggregate(AggregateError::UnknownGrade(_)) => ErrorCode::UnknownGrade,
        }
    }
}

/// What happened to a committed snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    /// Written to the durable slot.
    pub persisted: bool,
    /// Delivered over the channel; when false the sentinel key was written.
    pub broadcast: bool,
    #[serde(with = "crate::model::snapshot::iso_millis")]
    pub last_updated: DateTime<Utc>,
}

/// Where an adopted snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncSource {
    Channel,
    Sentinel,
    Poll,
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Updated { source: SyncSource },
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Snapshot)>;

/// Owner of the live snapshot for one scoreboard context.
pub struct Store {
    slot: Box<dyn Slot>,
    channel: Box<dyn Channel>,
    source: Option<Box<dyn DefaultSource>>,
    snapshot: Snapshot,
    origin: LoadOrigin,
    inbox: Option<Receiver<ChannelMessage>>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    last_trigger: Option<String>,
}

impl Store {
    /// Load through the bootstrap chain and start listening on `channel`.
    pub fn open<S, C>(slot: S, channel: C, source: Option<Box<dyn DefaultSource>>) -> Self
    where
        S: Slot + 'static,
        C: Channel + 'static,
    {
        let Loaded { snapshot, origin } = load(&slot, source.as_deref(), Utc::now());

        let inbox = match channel.listen() {
            Ok(rx) => Some(rx),
            Err(err) => {
                tracing::debug!(code = %err.code(), "no channel listener, relying on polling");
                None
            }
        };
        let last_trigger = slot.read(TRIGGER_KEY).ok().flatten();

        Self {
            slot: Box::new(slot),
            channel: Box::new(channel),
            source,
            snapshot,
            origin,
            inbox,
            subscribers: Vec::new(),
            next_subscription: 0,
            last_trigger,
        }
    }

    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Origin of the snapshot loaded at open or last refresh.
    #[must_use]
    pub const fn origin(&self) -> LoadOrigin {
        self.origin
    }

    /// Replace the in-memory snapshot without committing.
    pub fn replace(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
    }

    /// Stamp, persist, and broadcast the current snapshot.
    pub fn commit(&mut self) -> CommitReport {
        self.snapshot.touch(Utc::now());
        let stamp = self.snapshot.last_updated;

        let persisted = match self.persist() {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(code = %err.code(), "snapshot kept in memory only: {err}");
                false
            }
        };

        let broadcast = match self
            .channel
            .publish(&ChannelMessage::data_updated(&self.snapshot))
        {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(code = %err.code(), "publish failed, writing update trigger");
                let trigger = stamp.timestamp_millis().to_string();
                if let Err(err) = self.slot.write(TRIGGER_KEY, &trigger) {
                    tracing::warn!(code = %err.code(), "update trigger not written: {err}");
                } else {
                    self.last_trigger = Some(trigger);
                }
                false
            }
        };

        tracing::info!(%stamp, persisted, broadcast, "snapshot committed");
        CommitReport {
            persisted,
            broadcast,
            last_updated: stamp,
        }
    }

    fn persist(&self) -> Result<(), SlotError> {
        let raw = self.snapshot.to_json_pretty().map_err(|err| SlotError::Write {
            key: DATA_KEY.to_string(),
            source: err.into(),
        })?;
        self.slot.write(DATA_KEY, &raw)
    }

    /// Set or clear one podium position of an event.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the event or grade does not exist.
    pub fn set_placement(
        &mut self,
        event_id: &str,
        position: Position,
        grade: Option<GradeId>,
    ) -> Result<CommitReport, StoreError> {
        let report = aggregate::set_placement(&mut self.snapshot, event_id, position, grade)?;
        log_skipped(&report);
        Ok(self.commit())
    }

    /// Remove every placement from an event.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the event does not exist.
    pub fn clear_event(&mut self, event_id: &str) -> Result<CommitReport, StoreError> {
        let report = aggregate::clear_placements(&mut self.snapshot, event_id)?;
        log_skipped(&report);
        Ok(self.commit())
    }

    /// Overwrite a medal count from free-form input. Does not recompute.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the grade does not exist.
    pub fn set_medal_count(
        &mut self,
        grade: GradeId,
        kind: MedalKind,
        raw: &str,
    ) -> Result<CommitReport, StoreError> {
        let value = coerce_count(raw);
        *self.grade_mut(grade)?.count_mut(kind) = value;
        tracing::debug!(%grade, %kind, value, "medal count overridden");
        Ok(self.commit())
    }

    /// Add one medal to a grade. Does not recompute.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the grade does not exist.
    pub fn add_medal(&mut self, grade: GradeId, kind: MedalKind) -> Result<CommitReport, StoreError> {
        let count = self.grade_mut(grade)?.count_mut(kind);
        *count = count.saturating_add(1);
        Ok(self.commit())
    }

    /// Zero one grade's counts, leaving placements alone.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the grade does not exist.
    pub fn reset_grade(&mut self, grade: GradeId) -> Result<CommitReport, StoreError> {
        self.grade_mut(grade)?.reset();
        Ok(self.commit())
    }

    /// Zero every grade and empty every event's results.
    pub fn reset_all(&mut self) -> CommitReport {
        for grade in self.snapshot.grades.values_mut() {
            grade.reset();
        }
        for event in self.snapshot.sports.values_mut() {
            event.results.clear();
        }
        self.commit()
    }

    /// Recompute from placements, discarding manual overrides, and commit.
    pub fn save(&mut self) -> CommitReport {
        let report = aggregate::recompute_medals(&mut self.snapshot);
        log_skipped(&report);
        self.commit()
    }

    fn grade_mut(&mut self, grade: GradeId) -> Result<&mut crate::model::grade::Grade, StoreError> {
        self.snapshot
            .grades
            .get_mut(&grade)
            .ok_or(StoreError::Aggregate(AggregateError::UnknownGrade(grade)))
    }

    /// Register a callback invoked whenever a newer snapshot is adopted.
    pub fn subscribe(&mut self, callback: impl FnMut(&Snapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns whether `id` was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Pick up changes made elsewhere: channel messages, then the update
    /// trigger, then the slot itself.
    pub fn sync(&mut self) -> SyncOutcome {
        let mut best: Option<(Snapshot, SyncSource)> = None;
        let mut offer = |candidate: Snapshot, source: SyncSource| {
            let newest = best.as_ref().map_or(&self.snapshot, |(s, _)| s);
            if candidate.is_newer_than(newest) {
                best = Some((candidate, source));
            }
        };

        let mut disconnected = false;
        if let Some(inbox) = &self.inbox {
            loop {
                match inbox.try_recv() {
                    Ok(message) => offer(message.into_snapshot(), SyncSource::Channel),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
        }

        let trigger = match self.slot.read(TRIGGER_KEY) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(code = %err.code(), "update trigger unreadable: {err}");
                None
            }
        };
        let triggered = trigger.is_some() && trigger != self.last_trigger;

        match read_slot(&*self.slot) {
            Ok(snapshot) => {
                let source = if triggered {
                    SyncSource::Sentinel
                } else {
                    SyncSource::Poll
                };
                offer(snapshot, source);
            }
            Err(LoadError::Missing) => {}
            Err(err) => tracing::warn!(code = %err.code(), "poll skipped: {err}"),
        }

        if disconnected {
            tracing::debug!("channel closed, relying on polling");
            self.inbox = None;
        }
        if triggered {
            self.last_trigger = trigger;
        }

        match best {
            Some((snapshot, source)) => self.adopt(snapshot, source),
            None => SyncOutcome::Unchanged,
        }
    }

    /// Reload through the bootstrap chain, adopting only a strictly newer
    /// stored or bundled snapshot.
    pub fn refresh(&mut self) -> SyncOutcome {
        let loaded = load(&*self.slot, self.source.as_deref(), Utc::now());
        if loaded.origin == LoadOrigin::Fallback || !loaded.snapshot.is_newer_than(&self.snapshot) {
            return SyncOutcome::Unchanged;
        }
        self.origin = loaded.origin;
        self.adopt(loaded.snapshot, SyncSource::Refresh)
    }

    fn adopt(&mut self, snapshot: Snapshot, source: SyncSource) -> SyncOutcome {
        tracing::info!(
            ?source,
            last_updated = %snapshot.last_updated,
            "adopting newer snapshot"
        );
        self.snapshot = snapshot;
        for (_, callback) in &mut self.subscribers {
            callback(&self.snapshot);
        }
        SyncOutcome::Updated { source }
    }
}

fn log_skipped(report: &aggregate::RecomputeReport) {
    if !report.skipped.is_empty() {
        tracing::warn!(
            skipped = report.skipped.len(),
            "placements naming unknown grades were not counted"
        );
    }
}
