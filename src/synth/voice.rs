use crate::{
    config::AmplitudeMode,
    dsp::{delay::DelayLine, AmplitudeFollower, Excitation},
};

/*
Plucked String Voice
====================

Each voice is a Karplus–Strong string: a noise burst fed into a delay line
whose output is low-passed and fed straight back in.

                 excitation
                     │
                     ▼
        ┌────────▶ (+) ─────────────┬──────▶ out
        │                           │
        │                           ▼
    low-pass ◀──────────────── delay line (L samples)


Per sample, with excitation cursor c, delay line D and filter memory z:

    e    = excitation[c]   while c < L, else 0
    d    = D[cursor]
    z    = 0.499 * d + 0.499 * z
    out  = e + z
    D[cursor] = out,  cursor = (cursor + 1) mod L,  c = c + 1


Pitch
-----

The loop repeats every L = floor(sample_rate / f0) samples, so the string
sounds at sample_rate / L. Flooring makes high strings slightly sharp; the
delay is an integer number of samples and there is no fractional tuning.


Decay
-----

The two gains sum to 0.998. Every trip round the loop loses a little energy
at every frequency, so a plucked string always dies away, and it loses it
evenly across the signal so there is no DC build-up. High partials lose more
per trip than the fundamental, which is what makes it sound like a string.


Pluck
-----

A pluck only rewinds the excitation cursor. Whatever is already ringing in
the delay line keeps ringing and the new burst is added on top.
*/

/// Gain applied to both the delayed sample and the filter memory.
pub const FEEDBACK_GAIN: f32 = 0.499;

/// One step of the feedback loop: low-pass the delayed sample into the filter
/// memory and add the excitation.
#[inline]
pub fn feedback_step(excitation: f32, delayed: f32, filter_z: &mut f32) -> f32 {
    *filter_z = FEEDBACK_GAIN * delayed + FEEDBACK_GAIN * *filter_z;
    excitation + *filter_z
}

/// Delay length for a fundamental: `floor(sample_rate / f0)`, at least 1.
pub fn delay_len_for(sample_rate: u32, f0: f32) -> usize {
    ((sample_rate as f64 / f0 as f64).floor() as usize).max(1)
}

/// Cheap positional value in [0, 1) used to animate string displacement.
///
/// `((cursor / 3) mod L) / L`. It has no acoustic meaning.
#[inline]
pub fn vibration_at(excitation_cursor: u64, delay_len: usize) -> f32 {
    let len = delay_len.max(1) as u64;
    ((excitation_cursor / 3) % len) as f32 / len as f32
}

/// A single plucked string.
pub struct Voice {
    f0: f32,
    delay: DelayLine,
    filter_z: f32,
    /// Samples since the last pluck. Only a pluck moves it backwards.
    excitation_cursor: u64,
    follower: AmplitudeFollower,
}

impl Voice {
    /// A silent string at `f0`. The excitation cursor starts past the burst, so
    /// nothing sounds until the first pluck.
    pub fn new(sample_rate: u32, f0: f32, amplitude_mode: AmplitudeMode) -> Self {
        let delay_len = delay_len_for(sample_rate, f0);
        Self {
            f0,
            delay: DelayLine::new(delay_len),
            filter_z: 0.0,
            excitation_cursor: delay_len as u64,
            follower: AmplitudeFollower::new(amplitude_mode, sample_rate),
        }
    }

    /// Restart the excitation burst. Delay line and filter memory are untouched.
    pub fn pluck(&mut self) {
        self.excitation_cursor = 0;
    }

    /// Advance one sample and return this string's contribution.
    #[inline]
    pub fn tick(&mut self, excitation: &Excitation) -> f32 {
        let burst = if self.excitation_cursor < self.delay.len() as u64 {
            excitation.get(self.excitation_cursor as usize).unwrap_or(0.0)
        } else {
            0.0
        };

        let out = feedback_step(burst, self.delay.read(), &mut self.filter_z);
        // Feedback write lands before the cursor moves
        self.delay.write_and_advance(out);
        self.follower.next_sample(out);
        self.excitation_cursor += 1;

        out
    }

    /// Add this string's next `out.len()` samples onto `out`.
    pub fn render_add(&mut self, excitation: &Excitation, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample += self.tick(excitation);
        }
    }

    pub fn amplitude(&self) -> f32 {
        self.follower.level()
    }

    pub fn vibration(&self) -> f32 {
        vibration_at(self.excitation_cursor, self.delay.len())
    }

    pub fn f0(&self) -> f32 {
        self.f0
    }

    pub fn delay_len(&self) -> usize {
        self.delay.len()
    }

    pub fn cursor(&self) -> usize {
        self.delay.cursor()
    }

    pub fn excitation_cursor(&self) -> u64 {
        self.excitation_cursor
    }

    pub fn filter_state(&self) -> f32 {
        self.filter_z
    }

    pub fn delay_line(&self) -> &[f32] {
        self.delay.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44_100;

    fn string(f0: f32) -> (Voice, Excitation) {
        (
            Voice::new(SAMPLE_RATE, f0, AmplitudeMode::Envelope),
            Excitation::for_sample_rate(SAMPLE_RATE, 0),
        )
    }

    #[test]
    fn delay_length_floors() {
        assert_eq!(delay_len_for(44_100, 440.0), 100);
        assert_eq!(delay_len_for(48_000, 440.0), 109);
        assert_eq!(delay_len_for(48_000, 48_000.0), 1);
    }

    #[test]
    fn gains_sum_below_unity() {
        assert!(FEEDBACK_GAIN + FEEDBACK_GAIN < 1.0);
        assert!((FEEDBACK_GAIN + FEEDBACK_GAIN - 0.998).abs() < 1e-6);
    }

    #[test]
    fn starts_silent() {
        let (mut voice, excitation) = string(440.0);
        assert_eq!(voice.amplitude(), 0.0);
        assert!(voice.excitation_cursor() >= voice.delay_len() as u64);

        for _ in 0..1_000 {
            assert_eq!(voice.tick(&excitation), 0.0);
        }
    }

    #[test]
    fn first_pass_is_the_burst() {
        let (mut voice, excitation) = string(440.0);
        voice.pluck();
        assert_eq!(voice.excitation_cursor(), 0);

        for n in 0..voice.delay_len() {
            assert_eq!(voice.tick(&excitation), excitation.as_slice()[n]);
        }
    }

    #[test]
    fn pluck_keeps_ringing_energy() {
        let (mut voice, excitation) = string(220.0);
        voice.pluck();
        for _ in 0..1_000 {
            voice.tick(&excitation);
        }
        let line_before = voice.delay_line().to_vec();
        let z_before = voice.filter_state();

        voice.pluck();
        assert_eq!(voice.delay_line(), line_before.as_slice());
        assert_eq!(voice.filter_state(), z_before);
        assert_eq!(voice.excitation_cursor(), 0);
    }

    #[test]
    fn vibration_stays_in_unit_interval() {
        let (mut voice, excitation) = string(1_000.0);
        voice.pluck();
        for _ in 0..10_000 {
            voice.tick(&excitation);
            let v = voice.vibration();
            assert!((0.0..1.0).contains(&v), "vibration {v} out of range");
        }
    }

    #[test]
    fn vibration_formula() {
        assert_eq!(vibration_at(0, 100), 0.0);
        assert_eq!(vibration_at(30, 100), 0.1);
        assert_eq!(vibration_at(300, 100), 0.0);
        assert_eq!(vibration_at(302, 100), 0.0);
        assert_eq!(vibration_at(303, 100), 0.01);
    }
}
