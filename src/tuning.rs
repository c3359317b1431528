//! Frequency layouts for string banks.

/// Strings per harmonic set in [`string_set_frequency`].
pub const STRINGS_PER_SET: usize = 25;

/// Fundamental of set 0.
const BASE_HZ: f32 = 30.0;

/// Each set starts this much higher than the one before.
const SET_STEP_HZ: f32 = 10.0;

/// Stress-test layout: strings come in sets of 25 harmonics. Set `s` has
/// root `30 + 10·s` Hz and string `m` within it sounds at `(m + 1) · root`.
pub fn string_set_frequency(index: usize) -> f32 {
    let set = index / STRINGS_PER_SET;
    let harmonic = index % STRINGS_PER_SET;
    let root = BASE_HZ + set as f32 * SET_STEP_HZ;
    root * (harmonic + 1) as f32
}

/// The first `count` frequencies of [`string_set_frequency`].
pub fn string_set(count: usize) -> Vec<f32> {
    (0..count).map(string_set_frequency).collect()
}
