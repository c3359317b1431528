use tracing::debug;

use crate::{
    backend::module::{ForeignModule, MemPtr},
    config::{validate_frequency, AmplitudeMode},
    dsp::{AmplitudeFollower, Excitation},
    error::BackendError,
    synth::voice::{delay_len_for, feedback_step, vibration_at},
};

/// Linear memory grows in whole pages of this many bytes.
pub const PAGE_SIZE: usize = 65_536;

/// Upper bound on linear memory (1 GiB).
pub const MAX_PAGES: usize = 16_384;

const ALIGN: usize = 8;

/// A contiguous run of f32 samples inside linear memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    at: usize,
    len: usize,
}

/// Byte-addressed memory that only ever grows, a page at a time.
///
/// Growing may move the whole allocation, so any outside view of the bytes is
/// stale after a [`reserve`](Self::reserve) that grew. Offsets stay valid.
pub struct LinearMemory {
    bytes: Vec<u8>,
    top: usize,
    grow_count: usize,
}

impl LinearMemory {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; PAGE_SIZE],
            top: 0,
            grow_count: 0,
        }
    }

    /// Bump-allocate `size` bytes, growing by whole pages when needed.
    pub fn reserve(&mut self, size: usize) -> Result<usize, BackendError> {
        let at = self.top.next_multiple_of(ALIGN);
        let end = at
            .checked_add(size)
            .ok_or(BackendError::OutOfMemory { requested: size })?;

        if end > self.bytes.len() {
            let pages = end.div_ceil(PAGE_SIZE);
            if pages > MAX_PAGES {
                return Err(BackendError::OutOfMemory { requested: size });
            }
            debug!(from = self.pages(), to = pages, "linear memory grown");
            self.bytes.resize(pages * PAGE_SIZE, 0);
            self.grow_count += 1;
        }

        self.top = end;
        Ok(at)
    }

    #[inline]
    pub fn read_f32(&self, at: usize) -> f32 {
        match self.bytes.get(at..at + 4) {
            Some(raw) => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            None => 0.0,
        }
    }

    #[inline]
    pub fn write_f32(&mut self, at: usize, value: f32) {
        if let Some(raw) = self.bytes.get_mut(at..at + 4) {
            raw.copy_from_slice(&value.to_le_bytes());
        }
    }

    pub fn pages(&self) -> usize {
        self.bytes.len() / PAGE_SIZE
    }

    /// How many times the memory has grown since creation.
    pub fn grow_count(&self) -> usize {
        self.grow_count
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for LinearMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// String state kept on the module side; the delay line itself lives in
/// linear memory.
struct ArenaString {
    delay: Region,
    cursor: usize,
    filter_z: f32,
    excitation_cursor: u64,
    follower: AmplitudeFollower,
}

impl ArenaString {
    #[inline]
    fn tick(&mut self, memory: &mut LinearMemory, excitation: Region) -> f32 {
        let c = self.excitation_cursor;
        let burst = if c < self.delay.len as u64 && (c as usize) < excitation.len {
            memory.read_f32(excitation.at + c as usize * 4)
        } else {
            0.0
        };

        let slot = self.delay.at + self.cursor * 4;
        let out = feedback_step(burst, memory.read_f32(slot), &mut self.filter_z);
        memory.write_f32(slot, out);

        self.cursor += 1;
        if self.cursor == self.delay.len {
            self.cursor = 0;
        }
        self.follower.next_sample(out);
        self.excitation_cursor += 1;

        out
    }
}

/// Reference string module with its state in a page-grown linear memory.
///
/// Behaves like a separately compiled module would: every string added grows
/// memory for its delay line, the first one also lays down the excitation
/// noise, and the output buffer is carved out of the same memory. Adding a
/// string once the buffer exists is refused.
pub struct ArenaModule {
    memory: LinearMemory,
    strings: Vec<ArenaString>,
    excitation: Option<Region>,
    output: Option<Region>,
    seed: u32,
    amplitude_mode: AmplitudeMode,
}

impl ArenaModule {
    pub fn new() -> Self {
        Self {
            memory: LinearMemory::new(),
            strings: Vec::new(),
            excitation: None,
            output: None,
            seed: 0,
            amplitude_mode: AmplitudeMode::default(),
        }
    }

    /// Seed for the excitation noise, laid down when the first string is added.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_amplitude_mode(mut self, mode: AmplitudeMode) -> Self {
        self.amplitude_mode = mode;
        self
    }

    pub fn linear_memory(&self) -> &LinearMemory {
        &self.memory
    }

    fn reserve_samples(&mut self, len: usize) -> Result<Region, BackendError> {
        let bytes = len
            .checked_mul(4)
            .ok_or(BackendError::OutOfMemory { requested: usize::MAX })?;
        let at = self.memory.reserve(bytes)?;
        Ok(Region { at, len })
    }

    fn write_excitation(&mut self, sample_rate: u32) -> Result<Region, BackendError> {
        let noise = Excitation::for_sample_rate(sample_rate, self.seed);
        let region = self.reserve_samples(noise.len())?;
        for (i, &sample) in noise.as_slice().iter().enumerate() {
            self.memory.write_f32(region.at + i * 4, sample);
        }
        Ok(region)
    }
}

impl Default for ArenaModule {
    fn default() -> Self {
        Self::new()
    }
}

impl ForeignModule for ArenaModule {
    fn add_string(&mut self, sample_rate: u32, f0: f32) -> Result<(), BackendError> {
        if self.output.is_some() {
            return Err(BackendError::IllegalTransition);
        }
        validate_frequency(self.strings.len(), sample_rate, f0)?;

        if self.excitation.is_none() {
            self.excitation = Some(self.write_excitation(sample_rate)?);
        }

        let delay_len = delay_len_for(sample_rate, f0);
        let delay = self.reserve_samples(delay_len)?;
        self.strings.push(ArenaString {
            delay,
            cursor: 0,
            filter_z: 0.0,
            excitation_cursor: delay_len as u64,
            follower: AmplitudeFollower::new(self.amplitude_mode, sample_rate),
        });

        Ok(())
    }

    fn string_count(&self) -> usize {
        self.strings.len()
    }

    fn alloc(&mut self, len: usize) -> Result<MemPtr, BackendError> {
        if self.output.is_some() {
            return Err(BackendError::IllegalTransition);
        }
        let region = self.reserve_samples(len)?;
        let ptr = u32::try_from(region.at)
            .map_err(|_| BackendError::OutOfMemory { requested: len * 4 })?;
        self.output = Some(region);
        Ok(MemPtr(ptr))
    }

    fn process(&mut self, out: MemPtr, len: usize) {
        let (Some(excitation), Some(output)) = (self.excitation, self.output) else {
            return;
        };
        // Only the buffer handed out by `alloc` is writable, and only up to its length
        if out.offset() != output.at {
            return;
        }
        let len = len.min(output.len);
        let base = output.at;

        for i in 0..len {
            let mut mix = 0.0;
            for string in self.strings.iter_mut() {
                mix += string.tick(&mut self.memory, excitation);
            }
            self.memory.write_f32(base + i * 4, mix);
        }
    }

    fn pluck_string(&mut self, index: usize) {
        if let Some(string) = self.strings.get_mut(index) {
            string.excitation_cursor = 0;
        }
    }

    fn amplitude(&self, index: usize) -> f32 {
        self.strings.get(index).map_or(0.0, |s| s.follower.level())
    }

    fn vibration(&self, index: usize) -> f32 {
        self.strings
            .get(index)
            .map_or(0.0, |s| vibration_at(s.excitation_cursor, s.delay.len))
    }

    fn memory(&self) -> &[u8] {
        self.memory.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_grows_by_whole_pages() {
        let mut memory = LinearMemory::new();
        assert_eq!(memory.pages(), 1);

        let a = memory.reserve(10).unwrap();
        let b = memory.reserve(PAGE_SIZE).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b % ALIGN, 0);
        assert!(b >= 10);
        assert_eq!(memory.pages(), 2);
        assert_eq!(memory.grow_count(), 1);
    }

    #[test]
    fn reserve_refuses_past_the_limit() {
        let mut memory = LinearMemory::new();
        let err = memory.reserve(MAX_PAGES * PAGE_SIZE + 1).unwrap_err();
        assert!(matches!(err, BackendError::OutOfMemory { .. }));
        assert_eq!(memory.pages(), 1);
    }

    #[test]
    fn out_of_bounds_access_is_harmless() {
        let mut memory = LinearMemory::new();
        memory.write_f32(PAGE_SIZE - 2, 1.0);
        assert_eq!(memory.read_f32(PAGE_SIZE - 2), 0.0);
    }

    #[test]
    fn registration_grows_memory() {
        let mut module = ArenaModule::new();
        module.add_string(48_000, 55.0).unwrap();
        // one second of noise alone needs three pages
        assert!(module.linear_memory().pages() >= 3);
        assert!(module.linear_memory().grow_count() >= 1);
        assert_eq!(module.string_count(), 1);
    }

    #[test]
    fn adding_after_alloc_is_refused() {
        let mut module = ArenaModule::new();
        module.add_string(44_100, 440.0).unwrap();
        module.alloc(128).unwrap();

        assert_eq!(module.add_string(44_100, 220.0), Err(BackendError::IllegalTransition));
        assert_eq!(module.alloc(128), Err(BackendError::IllegalTransition));
        assert_eq!(module.string_count(), 1);
    }

    #[test]
    fn rejects_unusable_frequency() {
        let mut module = ArenaModule::new();
        assert!(matches!(
            module.add_string(44_100, 0.0),
            Err(BackendError::Rejected(_))
        ));
    }

    #[test]
    fn foreign_pointer_leaves_excitation_untouched() {
        let mut module = ArenaModule::new();
        module.add_string(44_100, 440.0).unwrap();
        let out = module.alloc(64).unwrap();
        module.pluck_string(0);
        // Two blocks take the string past its 100-sample burst
        module.process(out, 64);
        module.process(out, 64);

        let excitation = module.excitation.unwrap();
        let span = excitation.at..excitation.at + excitation.len * 4;
        let before = module.memory()[span.clone()].to_vec();

        module.process(MemPtr(excitation.at as u32), 64);
        assert_eq!(&module.memory()[span], before.as_slice());
    }

    #[test]
    fn process_before_alloc_writes_nothing() {
        let mut module = ArenaModule::new();
        module.add_string(44_100, 440.0).unwrap();
        let before = module.memory().to_vec();
        module.process(MemPtr(0), 64);
        assert_eq!(module.memory(), before.as_slice());
    }
}
