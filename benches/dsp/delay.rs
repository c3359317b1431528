//! Benchmarks for the circular delay line.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use karplus_dsp::dsp::delay::DelayLine;

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Delay lengths of real strings at 48kHz
    let lengths: &[usize] = &[
        32,    // 1.5kHz
        109,   // A4
        1_600, // 30Hz
    ];

    for &size in BLOCK_SIZES {
        for &len in lengths {
            let mut line = DelayLine::new(len);
            group.bench_with_input(
                BenchmarkId::new(format!("feedback_{len}"), size),
                &size,
                |b, &size| {
                    b.iter(|| {
                        for _ in 0..size {
                            let delayed = line.read();
                            line.write_and_advance(black_box(delayed * 0.998 + 1e-3));
                        }
                    })
                },
            );
        }
    }

    group.finish();
}
