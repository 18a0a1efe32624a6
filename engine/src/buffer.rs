/// Growth-only byte buffer holding the most recent decoded frame.
///
/// The logical length tracks the last frame stored while the allocation only
/// ever grows, so streams whose frame size wobbles do not reallocate per frame.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    data: Vec<u8>,
    reallocations: u32,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `bytes`, growing the allocation if needed
    pub fn store(&mut self, bytes: &[u8]) {
        if bytes.len() > self.data.capacity() {
            let previous = self.data.capacity();
            // Nothing worth keeping; drop the old bytes before growing
            self.data.clear();
            self.data.reserve_exact(bytes.len());
            self.reallocations += 1;
            log::debug!(
                "Frame buffer grown from {} to {} bytes",
                previous,
                self.data.capacity()
            );
        }

        self.data.clear();
        self.data.extend_from_slice(bytes);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes of the most recent frame
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Largest size ever allocated
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn reallocations(&self) -> u32 {
        self.reallocations
    }
}
