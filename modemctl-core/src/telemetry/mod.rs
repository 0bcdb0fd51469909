//! Telemetry event catalog and ring buffer shared by firmware and host targets.
//!
//! The control context records every line it drives, every lifecycle
//! transition, every trigger re-arm, and the conditions the sequencer swallows
//! (a held write lock, a power-off that never saw the modem let go). Records
//! live in a fixed-capacity ring so the recorder can sit inside the context
//! lock and be written from interrupt context without allocation.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::irq::TriggerLevel;
use crate::lifecycle::LifecycleState;
use crate::lines::{GpioNum, Level, ModemLine};
use crate::link::WritePend;
use crate::monitor::PhoneActiveSample;
use crate::sequences::SequenceKind;

/// Identifier assigned to each telemetry record.
pub type EventId = u32;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Discriminated telemetry events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryEventKind {
    LineDriven(ModemLine, Level),
    StateChanged(LifecycleState),
    TriggerArmed(TriggerLevel),
    SequenceStarted(SequenceKind),
    SequenceComplete(SequenceKind),
    WritePendObserved(WritePend),
    /// Power-off gave up waiting for `PHONE_ACTIVE` to drop.
    PowerOffTimeout,
}

impl fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEventKind::LineDriven(line, Level::High) => write!(f, "line-high {line}"),
            TelemetryEventKind::LineDriven(line, Level::Low) => write!(f, "line-low {line}"),
            TelemetryEventKind::StateChanged(state) => write!(f, "state {state}"),
            TelemetryEventKind::TriggerArmed(trigger) => write!(f, "trigger {trigger}"),
            TelemetryEventKind::SequenceStarted(kind) => write!(f, "sequence-started {kind}"),
            TelemetryEventKind::SequenceComplete(kind) => write!(f, "sequence-complete {kind}"),
            TelemetryEventKind::WritePendObserved(WritePend::Locked) => {
                f.write_str("write-pend locked")
            }
            TelemetryEventKind::WritePendObserved(WritePend::Unlocked) => {
                f.write_str("write-pend unlocked")
            }
            TelemetryEventKind::PowerOffTimeout => f.write_str("power-off-timeout"),
        }
    }
}

/// Payloads carried alongside telemetry events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryPayload {
    /// No additional metadata accompanies the event.
    None,
    /// GPIO that was written.
    Line(GpioNum),
    /// Line levels that led to a monitor decision.
    Monitor(PhoneActiveSample),
    /// Waits spent by the power-off poll loop.
    Retries(u8),
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryRecord {
    pub id: EventId,
    pub event: TelemetryEventKind,
    pub details: TelemetryPayload,
}

/// Records telemetry events into a fixed-size ring buffer.
pub struct TelemetryRecorder<const CAPACITY: usize = TELEMETRY_RING_CAPACITY> {
    ring: HistoryBuf<TelemetryRecord, CAPACITY>,
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

    /// Returns an iterator over the recorded telemetry in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, TelemetryRecord> {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent telemetry record, if available.
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no telemetry records are stored.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Counts stored records whose event equals `event`.
    pub fn count(&self, event: TelemetryEventKind) -> usize {
        self.oldest_first()
            .filter(|record| record.event == event)
            .count()
    }

    /// Records a line write.
    pub fn record_line(&mut self, line: ModemLine, gpio: GpioNum, level: Level) -> EventId {
        self.record(
            TelemetryEventKind::LineDriven(line, level),
            TelemetryPayload::Line(gpio),
        )
    }

    /// Records a lifecycle transition, with the sample that caused it when the
    /// monitor made the call.
    pub fn record_state(
        &mut self,
        state: LifecycleState,
        sample: Option<PhoneActiveSample>,
    ) -> EventId {
        let payload = sample.map_or(TelemetryPayload::None, TelemetryPayload::Monitor);
        self.record(TelemetryEventKind::StateChanged(state), payload)
    }

    /// Records an arbitrary telemetry event with the supplied payload.
    pub fn record(&mut self, event: TelemetryEventKind, payload: TelemetryPayload) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            event,
            details: payload,
        });

        id
    }

    /// Drops every stored record. Event identifiers keep counting.
    pub fn clear(&mut self) {
        self.ring.clear();
    }
}

impl<const CAPACITY: usize> Default for TelemetryRecorder<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}
