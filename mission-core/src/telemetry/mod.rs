//! Mission event log shared by host targets.
//!
//! Events land in a fixed-capacity ring buffer with monotonically assigned
//! ids and the poll-iteration number they occurred at, so hosts can drain a
//! bounded history after (or during) a run without any allocation. This is
//! the only logging surface of the core; the emulator prints drained records
//! and the integration tests assert phase sequencing through them.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::arena::BallColor;
use crate::geometry::Point;
use crate::phases::PhaseStateTag;

/// Monotonically increasing identifier assigned to each record.
pub type EventId = u32;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 128;

/// Discriminated mission events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MissionEventKind {
    /// A phase state machine entered the tagged state.
    StateEntered(PhaseStateTag),
    /// The gripper closed on a ball at the given cell.
    BallGrabbed(Point),
    /// The color sensor classified the carried ball, keyed by grab cell.
    ColorRecorded(Point, BallColor),
    /// A ball was released on the given deposit cell.
    BallDeposited(Point),
    /// A grid read outside the allocation failed closed at this coordinate.
    OutOfRangeRead(Point),
    /// The termination predicate held and the mission finished.
    MissionComplete,
    /// The cancellation hook asked the loop to stop.
    MissionStopped,
    /// The step budget ran out before the termination predicate held.
    MissionStalled,
}

impl fmt::Display for MissionEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissionEventKind::StateEntered(tag) => write!(f, "state-entered {tag}"),
            MissionEventKind::BallGrabbed(at) => write!(f, "ball-grabbed {at}"),
            MissionEventKind::ColorRecorded(at, color) => {
                write!(f, "color-recorded {at} {color}")
            }
            MissionEventKind::BallDeposited(at) => write!(f, "ball-deposited {at}"),
            MissionEventKind::OutOfRangeRead(at) => write!(f, "out-of-range-read {at}"),
            MissionEventKind::MissionComplete => f.write_str("mission-complete"),
            MissionEventKind::MissionStopped => f.write_str("mission-stopped"),
            MissionEventKind::MissionStalled => f.write_str("mission-stalled"),
        }
    }
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MissionRecord {
    pub id: EventId,
    /// Poll iteration the event was observed at.
    pub at_step: u32,
    pub event: MissionEventKind,
}

/// Records mission events into a fixed-size ring buffer.
#[derive(Debug)]
pub struct TelemetryRecorder<const CAPACITY: usize = TELEMETRY_RING_CAPACITY> {
    ring: HistoryBuf<MissionRecord, CAPACITY>,
    next_event_id: EventId,
}

impl<const CAPACITY: usize> TelemetryRecorder<CAPACITY> {
    /// Creates a new telemetry recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Records an event, returning its assigned id.
    pub fn record(&mut self, event: MissionEventKind, at_step: u32) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);
        self.ring.write(MissionRecord { id, at_step, event });
        id
    }

    /// Returns an iterator over the recorded events in chronological order.
    #[must_use]
    pub fn oldest_first(&self) -> OldestOrdered<'_, MissionRecord> {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent record, if available.
    #[must_use]
    pub fn latest(&self) -> Option<&MissionRecord> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// True when the retained history contains an entry into `tag`.
    #[must_use]
    pub fn entered_state(&self, tag: PhaseStateTag) -> bool {
        self.oldest_first()
            .any(|record| record.event == MissionEventKind::StateEntered(tag))
    }
}

impl<const CAPACITY: usize> Default for TelemetryRecorder<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_monotonic_ids_and_keeps_order() {
        let mut recorder = TelemetryRecorder::<8>::new();
        assert!(recorder.is_empty());

        let id1 = recorder.record(MissionEventKind::BallGrabbed(Point::new(2, 3)), 7);
        let id2 = recorder.record(MissionEventKind::MissionComplete, 9);
        assert_eq!(id1, 0);
        assert_eq!(id2, 1);
        assert_eq!(recorder.len(), 2);

        let latest = recorder.latest().copied().unwrap();
        assert_eq!(latest.event, MissionEventKind::MissionComplete);
        assert_eq!(latest.at_step, 9);

        let mut ordered = recorder.oldest_first();
        assert_eq!(
            ordered.next().map(|record| record.event),
            Some(MissionEventKind::BallGrabbed(Point::new(2, 3)))
        );
        assert_eq!(
            ordered.next().map(|record| record.event),
            Some(MissionEventKind::MissionComplete)
        );
        assert!(ordered.next().is_none());
    }

    #[test]
    fn ring_overwrites_oldest_when_full() {
        let mut recorder = TelemetryRecorder::<2>::new();
        recorder.record(MissionEventKind::MissionComplete, 0);
        recorder.record(MissionEventKind::MissionStopped, 1);
        recorder.record(MissionEventKind::MissionStalled, 2);

        assert_eq!(recorder.len(), 2);
        let mut ordered = recorder.oldest_first();
        assert_eq!(
            ordered.next().map(|record| record.event),
            Some(MissionEventKind::MissionStopped)
        );
        assert_eq!(
            ordered.next().map(|record| record.event),
            Some(MissionEventKind::MissionStalled)
        );
    }

    #[test]
    fn state_entry_lookup_scans_the_history() {
        let mut recorder = TelemetryRecorder::<8>::new();
        recorder.record(
            MissionEventKind::StateEntered(PhaseStateTag::GoToOrigin),
            3,
        );
        assert!(recorder.entered_state(PhaseStateTag::GoToOrigin));
        assert!(!recorder.entered_state(PhaseStateTag::GoToSafe));
    }
}
