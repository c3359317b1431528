//! Deterministic noise and the shared excitation buffer.

const KX: u32 = 123_456_789;
const KY: u32 = 362_436_069;
const KZ: u32 = 521_288_629;
const KW: u32 = 88_675_123;

/// Peak-to-peak span of the excitation noise. Samples land in [-0.75, 0.75].
const EXCITATION_SPAN: f32 = 1.5;

/// Xorshift128 generator. Cheap, seedable and good enough for noise bursts.
#[derive(Debug, Clone)]
pub struct Xorshift128 {
    x: u32,
    y: u32,
    z: u32,
    w: u32,
}

impl Xorshift128 {
    pub fn new(seed: u32) -> Self {
        Self {
            x: KX ^ seed,
            y: KY ^ seed,
            z: KZ,
            w: KW,
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let t = self.x ^ (self.x << 11);
        self.x = self.y;
        self.y = self.z;
        self.z = self.w;
        self.w ^= (self.w >> 19) ^ t ^ (t >> 8);
        self.w
    }

    /// Uniform sample in [0, 1].
    pub fn next_f32(&mut self) -> f32 {
        self.next_u32() as f32 / u32::MAX as f32
    }

    /// Uniform index in `0..bound`. `bound` must be non-zero.
    pub fn next_below(&mut self, bound: usize) -> usize {
        (self.next_u32() as usize) % bound
    }
}

/// The noise burst every voice reads from when plucked.
///
/// Built once, never written again. Voices only ever take `&Excitation`, so
/// any number of them can read it at the same time.
#[derive(Debug, Clone)]
pub struct Excitation {
    samples: Box<[f32]>,
}

impl Excitation {
    /// `len` samples of uniform noise scaled to roughly [-0.75, 0.75].
    pub fn new(len: usize, seed: u32) -> Self {
        let mut rng = Xorshift128::new(seed);
        let samples = (0..len)
            .map(|_| (rng.next_f32() - 0.5) * EXCITATION_SPAN)
            .collect();
        Self { samples }
    }

    /// One second of noise at `sample_rate`.
    pub fn for_sample_rate(sample_rate: u32, seed: u32) -> Self {
        Self::new(sample_rate as usize, seed)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.samples.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_noise() {
        let a = Excitation::new(512, 7);
        let b = Excitation::new(512, 7);
        assert_eq!(a.as_slice(), b.as_slice());

        let c = Excitation::new(512, 8);
        assert_ne!(a.as_slice(), c.as_slice());
    }

    #[test]
    fn noise_stays_in_range() {
        let excitation = Excitation::for_sample_rate(48_000, 0);
        assert_eq!(excitation.len(), 48_000);
        assert!(excitation.as_slice().iter().all(|s| s.abs() <= 0.75));
        assert!(excitation.as_slice().iter().any(|s| s.abs() > 0.5));
    }

    #[test]
    fn next_below_respects_bound() {
        let mut rng = Xorshift128::new(3);
        for _ in 0..1_000 {
            assert!(rng.next_below(10) < 10);
        }
    }
}
