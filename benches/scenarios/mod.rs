//! Real-world scenario benchmarks.
//!
//! Full string sets as the stress tester runs them: up to the voice limit,
//! through the in-process bank and through the linear-memory module.

mod engine;

pub use engine::bench_engine;
