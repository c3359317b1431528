use crate::config::AmplitudeMode;

/*
Amplitude Estimation
====================

Telemetry needs one number per string that says "how loud is it right now".
Two estimators are supported; both are fed `|out|` once per sample and both
are allocation-free.


Envelope follower (default)
---------------------------

A one-pole smoother on the rectified signal:

    env' = k * (env - |x|) + |x|

`k` is chosen so that, with no input, the envelope falls to 1% of where it
started after 10 ms:

    k = exp(ln(0.01) / samples_in_10ms)

At 48 kHz that is 480 samples and k ≈ 0.99045. The follower reacts on the
very next sample and decays smoothly, which reads well on a meter.


Rolling window
--------------

Sum |x| over a fixed number of samples and publish the mean when the window
is full. Between publications the reported value holds still, so the output
is steppier but never reacts to a single spike.

    |x|:   ▁▃█▅▂▁▁▃▆█▅▃▁▁ ...
           └──────┘└──────┘
    value:   mean0   mean1
*/

/// Time for the envelope follower to fall to 1% of its reference.
const ENVELOPE_DECAY_SECONDS: f32 = 0.010;

/// Per-voice amplitude estimator.
#[derive(Debug, Clone)]
pub enum AmplitudeFollower {
    Envelope {
        coeff: f32,
        level: f32,
    },
    Window {
        len: usize,
        filled: usize,
        sum: f32,
        level: f32,
    },
}

impl AmplitudeFollower {
    pub fn new(mode: AmplitudeMode, sample_rate: u32) -> Self {
        match mode {
            AmplitudeMode::Envelope => Self::Envelope {
                coeff: envelope_coeff(sample_rate),
                level: 0.0,
            },
            AmplitudeMode::Window { len } => Self::Window {
                len: len.max(1),
                filled: 0,
                sum: 0.0,
                level: 0.0,
            },
        }
    }

    /// Feed one output sample.
    #[inline]
    pub fn next_sample(&mut self, sample: f32) {
        let rectified = sample.abs();
        match self {
            Self::Envelope { coeff, level } => {
                *level = *coeff * (*level - rectified) + rectified;
            }
            Self::Window {
                len,
                filled,
                sum,
                level,
            } => {
                *sum += rectified;
                *filled += 1;
                if *filled == *len {
                    *level = *sum / *len as f32;
                    *sum = 0.0;
                    *filled = 0;
                }
            }
        }
    }

    /// Current estimate, always ≥ 0.
    #[inline]
    pub fn level(&self) -> f32 {
        match self {
            Self::Envelope { level, .. } | Self::Window { level, .. } => *level,
        }
    }
}

/// Smoothing coefficient for a decay to 1% over [`ENVELOPE_DECAY_SECONDS`].
pub fn envelope_coeff(sample_rate: u32) -> f32 {
    let samples = (ENVELOPE_DECAY_SECONDS * sample_rate as f32).max(1.0);
    (0.01f32.ln() / samples).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 48_000;

    #[test]
    fn envelope_falls_to_one_percent_in_ten_ms() {
        let mut follower = AmplitudeFollower::new(AmplitudeMode::Envelope, SAMPLE_RATE);
        for _ in 0..2_000 {
            follower.next_sample(1.0);
        }
        assert!((follower.level() - 1.0).abs() < 1e-3);

        for _ in 0..480 {
            follower.next_sample(0.0);
        }
        assert!(
            (follower.level() - 0.01).abs() < 1e-3,
            "expected ~0.01, got {}",
            follower.level()
        );
    }

    #[test]
    fn envelope_tracks_rectified_signal() {
        let mut follower = AmplitudeFollower::new(AmplitudeMode::Envelope, SAMPLE_RATE);
        for _ in 0..4_000 {
            follower.next_sample(-0.5);
        }
        assert!((follower.level() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn window_publishes_mean_when_full() {
        let mut follower = AmplitudeFollower::new(AmplitudeMode::Window { len: 4 }, SAMPLE_RATE);
        for sample in [1.0, -1.0, 0.5] {
            follower.next_sample(sample);
        }
        assert_eq!(follower.level(), 0.0, "window not yet full");

        follower.next_sample(-0.5);
        assert_eq!(follower.level(), 0.75);

        for _ in 0..4 {
            follower.next_sample(0.0);
        }
        assert_eq!(follower.level(), 0.0);
    }
}
