//! Benchmarks for the string primitives and full engine blocks.
//!
//! Run with: cargo bench
//!
//! Reference timing at 48kHz sample rate:
//!   - 64 samples  = 1.33ms deadline
//!   - 128 samples = 2.67ms deadline
//!   - 256 samples = 5.33ms deadline
//!   - 512 samples = 10.67ms deadline
//!
//! Benchmark groups:
//!   - dsp/*        Single voice and delay line
//!   - scenarios/*  Whole string sets through both backends, with telemetry

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Common buffer sizes used in audio applications.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

criterion_group!(
    benches,
    dsp::bench_delay,
    dsp::bench_voice,
    scenarios::bench_engine,
);
criterion_main!(benches);
