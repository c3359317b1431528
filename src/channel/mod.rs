//! Control and telemetry transports between the render context and the rest
//! of the program.
//!
//! Each direction has its delivery mode fixed when the engine is built:
//!
//! - control: [`ControlChannel::Direct`] (the host calls `Engine::pluck`) or
//!   [`ControlChannel::Queued`] (an SPSC queue drained at the top of every block)
//! - telemetry: [`TelemetryChannel::Message`] (one event per voice per tick) or
//!   [`TelemetryChannel::Queued`] (two `(slot, value)` records per voice per tick)
//!
//! Queued modes are selected through a one-time [`Handshake`]; without one the
//! engine falls back to direct/message delivery for that direction.

pub mod telemetry;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::{error::ChannelOverflow, synth::message::{ControlEvent, PluckSource}};

pub use telemetry::{
    telemetry_queue, ParamReader, ParamWriter, TelemetryEvent, TelemetryShadow, TelemetrySink,
};

/// One-time setup that hands the engine the shared queue for one direction.
pub enum Handshake {
    /// Plucks arrive through this queue.
    ControlIn(Consumer<ControlEvent>),
    /// Telemetry records leave through this queue.
    TelemetryOut(ParamWriter),
}

/// How plucks reach the engine.
pub enum ControlChannel {
    /// The host calls `Engine::pluck` itself, possibly from the render callback.
    Direct,
    /// Pending plucks are drained before each block is rendered.
    Queued(Box<dyn PluckSource>),
}

impl ControlChannel {
    /// Hand every event pending right now to `apply`.
    #[inline]
    pub(crate) fn drain(&mut self, mut apply: impl FnMut(ControlEvent)) {
        if let Self::Queued(source) = self {
            for _ in 0..source.pending() {
                match source.pop() {
                    Some(event) => apply(event),
                    None => break,
                }
            }
        }
    }
}

/// How analysis snapshots leave the engine.
pub enum TelemetryChannel {
    /// Nothing is produced.
    Disabled,
    /// One [`TelemetryEvent`] per voice per tick.
    Message(Box<dyn TelemetrySink>),
    /// Two change records per voice per tick: amplitude then vibration.
    Queued(ParamWriter),
}

impl TelemetryChannel {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    #[inline]
    pub(crate) fn publish(&mut self, event: TelemetryEvent) {
        match self {
            Self::Disabled => {}
            Self::Message(sink) => sink.post(event),
            Self::Queued(writer) => {
                writer.write(telemetry::amplitude_slot(event.voice) as u32, event.amplitude);
                writer.write(telemetry::vibration_slot(event.voice) as u32, event.vibration);
            }
        }
    }
}

/// Create a bounded pluck queue: the sender stays with the control side, the
/// consumer goes to the engine via [`Handshake::ControlIn`].
pub fn control_queue(capacity: usize) -> (PluckSender, Consumer<ControlEvent>) {
    let (producer, consumer) = RingBuffer::new(capacity.max(1));
    (
        PluckSender {
            producer,
            dropped: 0,
        },
        consumer,
    )
}

/// Non-realtime producer of pluck events.
pub struct PluckSender {
    producer: Producer<ControlEvent>,
    dropped: u64,
}

impl PluckSender {
    /// Queue a pluck. Never blocks; when the queue is full the event is
    /// dropped, counted, and reported.
    pub fn pluck(&mut self, voice: usize) -> Result<(), ChannelOverflow> {
        self.send(ControlEvent::Pluck { voice })
    }

    pub fn send(&mut self, event: ControlEvent) -> Result<(), ChannelOverflow> {
        self.producer.push(event).map_err(|_| {
            self.dropped += 1;
            ChannelOverflow
        })
    }

    /// Events dropped so far because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
