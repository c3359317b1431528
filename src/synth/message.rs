#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rtrb::Consumer;

/// Inbound control event.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// Restart the excitation of one string. Out-of-range indices are ignored.
    Pluck { voice: usize },
}

/// Source of pending control events, drained by the engine at the top of
/// every render block.
pub trait PluckSource: Send {
    fn pop(&mut self) -> Option<ControlEvent>;

    /// Events available right now. The engine drains at most this many per
    /// block, so a producer that keeps pushing cannot stall the render.
    fn pending(&self) -> usize;
}

impl PluckSource for Consumer<ControlEvent> {
    fn pop(&mut self) -> Option<ControlEvent> {
        Consumer::pop(self).ok()
    }

    fn pending(&self) -> usize {
        self.slots()
    }
}
