use tracing::info;

use crate::{backend::BackendState, error::BackendError};

/// Byte offset into a module's linear memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemPtr(pub u32);

impl MemPtr {
    pub fn offset(self) -> usize {
        self.0 as usize
    }
}

/// Exported surface of a loaded string-synthesis module.
///
/// The module owns a linear memory that may grow (and move) whenever a string
/// is added. A [`MemPtr`] returned by [`alloc`](Self::alloc) is therefore only
/// meaningful if no string is added afterwards. Hosts should not drive this
/// trait directly; [`ModuleBuilder`] enforces the ordering.
pub trait ForeignModule: Send {
    /// Register one string. May grow linear memory.
    ///
    /// Once [`alloc`](Self::alloc) has succeeded this returns
    /// [`BackendError::IllegalTransition`]. That error means the caller broke
    /// the ordering contract: treat it as fatal and drop the module rather
    /// than retrying.
    fn add_string(&mut self, sample_rate: u32, f0: f32) -> Result<(), BackendError>;

    fn string_count(&self) -> usize;

    /// Reserve an output buffer of `len` f32 samples.
    fn alloc(&mut self, len: usize) -> Result<MemPtr, BackendError>;

    /// Render `len` mixed samples into the buffer at `out`, overwriting it.
    /// Any pointer other than the one `alloc` returned is ignored.
    fn process(&mut self, out: MemPtr, len: usize);

    fn pluck_string(&mut self, index: usize);

    fn amplitude(&self, index: usize) -> f32;

    fn vibration(&self, index: usize) -> f32;

    /// Current view of linear memory. Only valid until the next mutating call.
    fn memory(&self) -> &[u8];
}

/// Registration phase of a foreign module.
///
/// Strings can only be added here. [`seal`](Self::seal) consumes the builder,
/// allocates the output buffer, and returns a [`ModuleRenderer`], which has no
/// way to register anything.
pub struct ModuleBuilder {
    module: Box<dyn ForeignModule>,
}

impl ModuleBuilder {
    pub fn new(module: Box<dyn ForeignModule>) -> Self {
        Self { module }
    }

    pub fn register(&mut self, sample_rate: u32, f0: f32) -> Result<(), BackendError> {
        self.module.add_string(sample_rate, f0)
    }

    pub fn voice_count(&self) -> usize {
        self.module.string_count()
    }

    /// Allocate the single output buffer and move to the rendering phase.
    pub fn seal(mut self, block_len: usize) -> Result<ModuleRenderer, BackendError> {
        let voice_count = self.module.string_count();
        if voice_count == 0 {
            return Err(BackendError::NoVoices);
        }

        let out = self.module.alloc(block_len)?;
        info!(voice_count, block_len, offset = out.offset(), "foreign module sealed");

        Ok(ModuleRenderer {
            module: self.module,
            out,
            block_len,
            voice_count,
            rendered: false,
        })
    }
}

/// Sealed module: renders into its one output buffer, answers queries, and
/// accepts plucks.
pub struct ModuleRenderer {
    module: Box<dyn ForeignModule>,
    out: MemPtr,
    block_len: usize,
    voice_count: usize,
    rendered: bool,
}

impl ModuleRenderer {
    pub fn voice_count(&self) -> usize {
        self.voice_count
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    pub fn state(&self) -> BackendState {
        if self.rendered {
            BackendState::Rendering
        } else {
            BackendState::Sealed
        }
    }

    pub fn pluck(&mut self, index: usize) {
        if index < self.voice_count {
            self.module.pluck_string(index);
        }
    }

    /// Fill `out`, calling into the module once per buffer-sized chunk and
    /// copying each chunk out before the next call overwrites it.
    pub fn render(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(self.block_len) {
            self.module.process(self.out, chunk.len());
            self.copy_out(chunk);
        }
        if !out.is_empty() {
            self.rendered = true;
        }
    }

    fn copy_out(&self, chunk: &mut [f32]) {
        let start = self.out.offset();
        let end = start + chunk.len() * 4;
        match self.module.memory().get(start..end) {
            Some(bytes) => {
                for (sample, raw) in chunk.iter_mut().zip(bytes.chunks_exact(4)) {
                    *sample = f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                }
            }
            // Buffer no longer inside memory: emit silence rather than garbage
            None => chunk.fill(0.0),
        }
    }

    /// Amplitude of one string. Zero until the first block has been rendered.
    pub fn amplitude(&self, index: usize) -> f32 {
        if self.rendered && index < self.voice_count {
            self.module.amplitude(index)
        } else {
            0.0
        }
    }

    /// Vibration of one string. Zero until the first block has been rendered.
    pub fn vibration(&self, index: usize) -> f32 {
        if self.rendered && index < self.voice_count {
            self.module.vibration(index)
        } else {
            0.0
        }
    }
}
