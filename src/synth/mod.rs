// Purpose: string voices and the engine that mixes them
// This layer sits on top of the dsp primitives and below the host callback

pub mod bank;
pub mod engine;
pub mod message;
pub mod voice;

pub use bank::VoiceBank;
pub use message::{ControlEvent, PluckSource};
pub use voice::Voice;
