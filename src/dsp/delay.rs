/// Circular delay line of fixed length.
///
/// One cursor does both jobs: the sample under it is the oldest one (the
/// delayed output), and it is overwritten with the new input before the cursor
/// moves on. With length `L` a written sample comes back out `L` steps later.
pub struct DelayLine {
    buffer: Box<[f32]>,
    cursor: usize,
}

impl DelayLine {
    /// A zeroed line of `len` samples. `len` is clamped to at least 1.
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)].into_boxed_slice(),
            cursor: 0,
        }
    }

    /// Oldest sample in the line.
    #[inline]
    pub fn read(&self) -> f32 {
        self.buffer[self.cursor]
    }

    /// Overwrite the oldest sample, then advance.
    #[inline]
    pub fn write_and_advance(&mut self, sample: f32) {
        self.buffer[self.cursor] = sample;
        self.cursor += 1;
        if self.cursor == self.buffer.len() {
            self.cursor = 0;
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_returns_after_len_steps() {
        let mut line = DelayLine::new(4);
        line.write_and_advance(1.0);
        for _ in 0..3 {
            assert_eq!(line.read(), 0.0);
            line.write_and_advance(0.0);
        }
        assert_eq!(line.read(), 1.0);
    }

    #[test]
    fn cursor_wraps() {
        let mut line = DelayLine::new(3);
        for _ in 0..3 {
            line.write_and_advance(0.5);
        }
        assert_eq!(line.cursor(), 0);
    }

    #[test]
    fn zero_length_is_clamped() {
        let mut line = DelayLine::new(0);
        assert_eq!(line.len(), 1);
        line.write_and_advance(0.25);
        assert_eq!(line.read(), 0.25);
    }
}
