//! Benchmarks for a single plucked string.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use karplus_dsp::{dsp::Excitation, synth::Voice, AmplitudeMode};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: u32 = 48_000;

pub fn bench_voice(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/voice");
    let excitation = Excitation::for_sample_rate(SAMPLE_RATE, 0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Ringing string, envelope follower
        let mut envelope = Voice::new(SAMPLE_RATE, 110.0, AmplitudeMode::Envelope);
        envelope.pluck();
        group.bench_with_input(BenchmarkId::new("envelope", size), &size, |b, _| {
            b.iter(|| {
                buffer.fill(0.0);
                envelope.render_add(&excitation, black_box(&mut buffer));
            })
        });

        // Same string, rolling-window amplitude (10ms)
        let mut window = Voice::new(SAMPLE_RATE, 110.0, AmplitudeMode::Window { len: 480 });
        window.pluck();
        group.bench_with_input(BenchmarkId::new("window", size), &size, |b, _| {
            b.iter(|| {
                buffer.fill(0.0);
                window.render_add(&excitation, black_box(&mut buffer));
            })
        });

        // Re-plucked every block: excitation read stays on the hot path
        let mut replucked = Voice::new(SAMPLE_RATE, 110.0, AmplitudeMode::Envelope);
        group.bench_with_input(BenchmarkId::new("replucked", size), &size, |b, _| {
            b.iter(|| {
                replucked.pluck();
                buffer.fill(0.0);
                replucked.render_add(&excitation, black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
