use tracing::debug;

use crate::{
    backend::{BackendState, RenderBackend},
    config::EngineConfig,
    dsp::Excitation,
    synth::voice::Voice,
};

/// In-process string bank: the shared excitation plus one [`Voice`] per
/// configured fundamental, addressed by index.
///
/// The slice is sized once at construction and never grows or shrinks.
pub struct VoiceBank {
    excitation: Excitation,
    voices: Box<[Voice]>,
}

impl VoiceBank {
    /// Build from an already validated config.
    pub(crate) fn from_config(config: &EngineConfig) -> Self {
        let excitation = Excitation::for_sample_rate(config.sample_rate, config.seed);
        let voices: Box<[Voice]> = config
            .frequencies
            .iter()
            .map(|&f0| Voice::new(config.sample_rate, f0, config.amplitude_mode))
            .collect();

        for (index, voice) in voices.iter().enumerate() {
            debug!(index, f0 = voice.f0(), delay_len = voice.delay_len(), "string ready");
        }

        Self { excitation, voices }
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn excitation(&self) -> &Excitation {
        &self.excitation
    }
}

impl RenderBackend for VoiceBank {
    fn voice_count(&self) -> usize {
        self.voices.len()
    }

    fn pluck(&mut self, index: usize) {
        if let Some(voice) = self.voices.get_mut(index) {
            voice.pluck();
        }
    }

    fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        // String-major: each voice streams through its own delay line once per block
        for voice in self.voices.iter_mut() {
            voice.render_add(&self.excitation, out);
        }
    }

    fn amplitude(&self, index: usize) -> f32 {
        self.voices.get(index).map_or(0.0, Voice::amplitude)
    }

    fn vibration(&self, index: usize) -> f32 {
        self.voices.get(index).map_or(0.0, Voice::vibration)
    }

    fn state(&self) -> BackendState {
        BackendState::Rendering
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(frequencies: &[f32]) -> VoiceBank {
        VoiceBank::from_config(&EngineConfig::new(44_100, frequencies.to_vec()))
    }

    #[test]
    fn out_of_range_pluck_is_ignored() {
        let mut bank = bank(&[220.0, 330.0]);
        bank.pluck(2);
        bank.pluck(usize::MAX);
        assert!(bank
            .voices()
            .iter()
            .all(|v| v.excitation_cursor() >= v.delay_len() as u64));
    }

    #[test]
    fn mix_is_sum_of_voices() {
        let mut solo_a = bank(&[220.0]);
        let mut solo_b = bank(&[330.0]);
        let mut duo = bank(&[220.0, 330.0]);
        for b in [&mut solo_a, &mut duo] {
            b.pluck(0);
        }
        solo_b.pluck(0);
        duo.pluck(1);

        let mut a = vec![0.0; 256];
        let mut b = vec![0.0; 256];
        let mut mix = vec![0.0; 256];
        solo_a.render(&mut a);
        solo_b.render(&mut b);
        duo.render(&mut mix);

        for i in 0..256 {
            assert!((mix[i] - (a[i] + b[i])).abs() < 1e-6);
        }
    }

    #[test]
    fn render_overwrites_output() {
        let mut bank = bank(&[220.0]);
        let mut out = vec![9.0; 64];
        bank.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn queries_past_the_end_report_silence() {
        let bank = bank(&[220.0]);
        assert_eq!(bank.amplitude(5), 0.0);
        assert_eq!(bank.vibration(5), 0.0);
    }
}
