//! Benchmarks for low-level DSP primitives.

mod delay;
mod voice;

pub use delay::bench_delay;
pub use voice::bench_voice;
