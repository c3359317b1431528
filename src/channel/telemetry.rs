//! Outbound per-string analysis data.
//!
//! Telemetry is best-effort. A full queue drops the record and the render
//! carries on; the UI simply shows a slightly stale value.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rtrb::{Consumer, Producer, RingBuffer};

/// Bytes per change record: `[slot: u32 LE][value: f32 LE]`.
pub const RECORD_LEN: usize = 8;

/// Slots per voice in the shadow array: amplitude, then vibration.
pub const SLOTS_PER_VOICE: usize = 2;

/// One analysis snapshot for one string.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryEvent {
    pub voice: usize,
    /// Amplitude estimate, ≥ 0.
    pub amplitude: f32,
    /// Positional display value in [0, 1).
    pub vibration: f32,
}

/// Fire-and-forget receiver for message-mode telemetry.
///
/// Called from the render path: implementations must not block or allocate.
/// Delivery failures are not reported back.
pub trait TelemetrySink: Send {
    fn post(&mut self, event: TelemetryEvent);
}

impl TelemetrySink for Producer<TelemetryEvent> {
    fn post(&mut self, event: TelemetryEvent) {
        let _ = self.push(event);
    }
}

/// Shadow-array slot holding a voice's amplitude.
#[inline]
pub const fn amplitude_slot(voice: usize) -> usize {
    voice * SLOTS_PER_VOICE
}

/// Shadow-array slot holding a voice's vibration.
#[inline]
pub const fn vibration_slot(voice: usize) -> usize {
    voice * SLOTS_PER_VOICE + 1
}

/// Create a byte queue that holds `records` change records.
pub fn telemetry_queue(records: usize) -> (ParamWriter, ParamReader) {
    let (producer, consumer) = RingBuffer::new(records.max(1) * RECORD_LEN);
    (
        ParamWriter {
            producer,
            dropped: 0,
        },
        ParamReader { consumer },
    )
}

/// Render-side end of the telemetry byte queue.
pub struct ParamWriter {
    producer: Producer<u8>,
    dropped: u64,
}

impl ParamWriter {
    /// Append one `(slot, value)` record. Records are written whole or not at
    /// all; when fewer than [`RECORD_LEN`] bytes are free the record is
    /// dropped and counted.
    pub fn write(&mut self, slot: u32, value: f32) -> bool {
        let mut record = [0u8; RECORD_LEN];
        record[..4].copy_from_slice(&slot.to_le_bytes());
        record[4..].copy_from_slice(&value.to_le_bytes());

        match self.producer.write_chunk(RECORD_LEN) {
            Ok(mut chunk) => {
                let (first, second) = chunk.as_mut_slices();
                let split = first.len();
                first.copy_from_slice(&record[..split]);
                second.copy_from_slice(&record[split..]);
                chunk.commit_all();
                true
            }
            Err(_) => {
                self.dropped += 1;
                false
            }
        }
    }

    /// Records dropped so far because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Consumer end of the telemetry byte queue.
pub struct ParamReader {
    consumer: Consumer<u8>,
}

impl ParamReader {
    /// Next record in FIFO order.
    pub fn read(&mut self) -> Option<(u32, f32)> {
        let chunk = self.consumer.read_chunk(RECORD_LEN).ok()?;
        let mut record = [0u8; RECORD_LEN];
        let (first, second) = chunk.as_slices();
        record[..first.len()].copy_from_slice(first);
        record[first.len()..].copy_from_slice(second);
        chunk.commit_all();

        let slot = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
        let value = f32::from_le_bytes([record[4], record[5], record[6], record[7]]);
        Some((slot, value))
    }

    /// Apply every queued record to `shadow`. Returns how many were read.
    pub fn drain_into(&mut self, shadow: &mut TelemetryShadow) -> usize {
        let mut applied = 0;
        while let Some((slot, value)) = self.read() {
            shadow.apply(slot as usize, value);
            applied += 1;
        }
        applied
    }
}

/// Latest known value for every slot, as seen by the consumer.
#[derive(Debug, Clone)]
pub struct TelemetryShadow {
    slots: Vec<f32>,
}

impl TelemetryShadow {
    pub fn new(voice_count: usize) -> Self {
        Self {
            slots: vec![0.0; voice_count * SLOTS_PER_VOICE],
        }
    }

    /// Store `value` at `slot`. Unknown slots are ignored.
    pub fn apply(&mut self, slot: usize, value: f32) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = value;
        }
    }

    pub fn amplitude(&self, voice: usize) -> f32 {
        self.slots.get(amplitude_slot(voice)).copied().unwrap_or(0.0)
    }

    pub fn vibration(&self, voice: usize) -> f32 {
        self.slots.get(vibration_slot(voice)).copied().unwrap_or(0.0)
    }

    pub fn voice_count(&self) -> usize {
        self.slots.len() / SLOTS_PER_VOICE
    }

    pub fn slots(&self) -> &[f32] {
        &self.slots
    }
}
