//! Benchmarks for complete engine blocks.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use karplus_dsp::{
    backend::ArenaModule,
    channel::{telemetry_queue, Handshake},
    tuning, Engine, EngineConfig, RenderBackend,
};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: u32 = 48_000;
const VOICE_COUNTS: &[usize] = &[1, 25, 100];

fn config(voices: usize) -> EngineConfig {
    EngineConfig::new(SAMPLE_RATE, tuning::string_set(voices))
}

/// Pluck everything once so every string is ringing.
fn ring_all<B: RenderBackend>(engine: &mut Engine<B>) {
    for voice in 0..engine.voice_count() {
        engine.pluck(voice);
    }
}

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for &voices in VOICE_COUNTS {
            // === IN-PROCESS ===
            let mut engine = match Engine::new(config(voices)) {
                Ok(engine) => engine,
                Err(err) => panic!("bench config rejected: {err}"),
            };
            ring_all(&mut engine);
            group.bench_with_input(
                BenchmarkId::new(format!("in_process_{voices}"), size),
                &size,
                |b, _| b.iter(|| engine.render_block(black_box(&mut buffer))),
            );

            // === IN-PROCESS + QUEUED TELEMETRY ===
            // Reader is never drained: measures the full-queue drop path too
            let (writer, _reader) = telemetry_queue(voices * 2 * 4);
            let mut engine = match Engine::builder(config(voices).telemetry(true))
                .handshake(Handshake::TelemetryOut(writer))
                .build()
            {
                Ok(engine) => engine,
                Err(err) => panic!("bench config rejected: {err}"),
            };
            ring_all(&mut engine);
            group.bench_with_input(
                BenchmarkId::new(format!("telemetry_{voices}"), size),
                &size,
                |b, _| b.iter(|| engine.render_block(black_box(&mut buffer))),
            );

            // === LINEAR-MEMORY MODULE ===
            let (mut engine, installer) = match Engine::builder(config(voices).block_len(size)).build_foreign() {
                Ok(pair) => pair,
                Err(err) => panic!("bench config rejected: {err}"),
            };
            if let Err(err) = installer.install(Box::new(ArenaModule::new())) {
                panic!("module install failed: {err}");
            }
            engine.render_block(&mut buffer); // picks up the renderer
            ring_all(&mut engine);
            group.bench_with_input(
                BenchmarkId::new(format!("module_{voices}"), size),
                &size,
                |b, _| b.iter(|| engine.render_block(black_box(&mut buffer))),
            );
        }
    }

    group.finish();
}
