//! Frame handoff between the decoder thread and the render thread
//!
//! The decoder callback writes into a single-slot mailbox guarded by one
//! mutex; the render thread uploads from it during `update` and releases it
//! in `draw`. At most one unconsumed frame exists at any time and frames that
//! arrive while the slot is full are dropped, never queued.

use crate::buffer::FrameBuffer;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A decoded frame as handed over by a decode backend
#[derive(Debug, Clone, Copy)]
pub struct DecodedFrame<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Bytes per row, at least `width * 2`
    pub stride: usize,
}

/// Everything shared with the decoder thread
#[derive(Debug, Default)]
pub(crate) struct SlotState {
    pub(crate) buffer: FrameBuffer,
    pub(crate) ready: bool,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) stride: usize,
    /// Deliveries are ignored unless a playback session is open
    pub(crate) accepting: bool,
    /// Cleared when the frame byte size no longer matches the live texture
    pub(crate) texture_valid: bool,
    pub(crate) delivered: u64,
    pub(crate) dropped: u64,
}

/// Shared single-slot frame mailbox
#[derive(Debug, Clone, Default)]
pub struct FrameSlot {
    state: Arc<Mutex<SlotState>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SlotState> {
        // A panicking decoder thread must not take the render thread down with it
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a frame from the decoder thread.
    ///
    /// Returns `true` if the frame was kept, `false` if it was dropped
    /// because the previous one has not been consumed yet (or no session is
    /// open).
    pub fn deliver(&self, frame: DecodedFrame<'_>) -> bool {
        let mut state = self.lock();

        if !state.accepting {
            return false;
        }

        if state.ready {
            state.dropped += 1;
            log::trace!("Video frame dropped (previous frame not consumed yet)");
            return false;
        }

        if state.width == 0 || state.height == 0 {
            state.width = frame.width;
            state.height = frame.height;
            if state.width != 0 && state.height != 0 {
                log::debug!("Video dimensions: {}x{}", state.width, state.height);
            }
        }

        if state.width == 0 || state.height == 0 {
            return false;
        }

        if state.texture_valid && state.buffer.len() != frame.data.len() {
            log::debug!(
                "Frame size changed from {} to {} bytes, texture will be recreated",
                state.buffer.len(),
                frame.data.len()
            );
            state.texture_valid = false;
        }

        state.buffer.store(frame.data);
        state.stride = frame.stride;
        state.ready = true;
        state.delivered += 1;
        true
    }

    /// Start accepting frames for a new playback session
    pub fn open(&self) {
        let mut state = self.lock();
        state.accepting = true;
        state.ready = false;
    }

    /// Stop accepting frames and forget the session's dimensions
    pub fn close(&self) {
        let mut state = self.lock();
        state.accepting = false;
        state.ready = false;
        state.width = 0;
        state.height = 0;
    }

    /// Mark the pending frame as consumed
    pub fn consume(&self) {
        self.lock().ready = false;
    }

    pub fn is_ready(&self) -> bool {
        self.lock().ready
    }

    pub fn dimensions(&self) -> (u32, u32) {
        let state = self.lock();
        (state.width, state.height)
    }

    /// Logical size and capacity of the frame buffer
    pub fn buffer_size(&self) -> (usize, usize) {
        let state = self.lock();
        (state.buffer.len(), state.buffer.capacity())
    }

    /// Copy of the bytes currently held in the slot
    pub fn frame_bytes(&self) -> Vec<u8> {
        self.lock().buffer.as_slice().to_vec()
    }

    /// Frames kept and frames dropped so far
    pub fn counters(&self) -> (u64, u64) {
        let state = self.lock();
        (state.delivered, state.dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(data: &[u8], width: u32, height: u32) -> DecodedFrame<'_> {
        DecodedFrame {
            data,
            width,
            height,
            stride: width as usize * 2,
        }
    }

    #[test]
    fn test_closed_slot_ignores_frames() {
        let slot = FrameSlot::new();
        assert!(!slot.deliver(frame(&[1; 8], 2, 2)));
        assert!(!slot.is_ready());
        assert_eq!(slot.dimensions(), (0, 0));
    }

    #[test]
    fn test_second_frame_dropped_until_consumed() {
        let slot = FrameSlot::new();
        slot.open();

        assert!(slot.deliver(frame(&[1; 8], 2, 2)));
        assert!(!slot.deliver(frame(&[2; 8], 2, 2)));
        assert_eq!(slot.frame_bytes(), vec![1; 8]);
        assert_eq!(slot.counters(), (1, 1));

        slot.consume();
        assert!(slot.deliver(frame(&[3; 8], 2, 2)));
        assert_eq!(slot.frame_bytes(), vec![3; 8]);
    }

    #[test]
    fn test_dimensions_taken_from_first_frame_only() {
        let slot = FrameSlot::new();
        slot.open();

        slot.deliver(frame(&[0; 8], 2, 2));
        slot.consume();
        slot.deliver(frame(&[0; 16], 4, 2));
        assert_eq!(slot.dimensions(), (2, 2));
    }

    #[test]
    fn test_zero_sized_frame_not_stored() {
        let slot = FrameSlot::new();
        slot.open();

        assert!(!slot.deliver(frame(&[], 0, 0)));
        assert!(!slot.is_ready());
        assert_eq!(slot.buffer_size().0, 0);
    }

    #[test]
    fn test_size_change_invalidates_texture() {
        let slot = FrameSlot::new();
        slot.open();
        slot.deliver(frame(&[0; 8], 2, 2));
        slot.lock().texture_valid = true;
        slot.consume();

        slot.deliver(frame(&[0; 8], 2, 2));
        assert!(slot.lock().texture_valid);
        slot.consume();

        slot.deliver(frame(&[0; 32], 4, 4));
        assert!(!slot.lock().texture_valid);
    }

    #[test]
    fn test_close_resets_session() {
        let slot = FrameSlot::new();
        slot.open();
        slot.deliver(frame(&[5; 8], 2, 2));

        slot.close();
        assert!(!slot.is_ready());
        assert_eq!(slot.dimensions(), (0, 0));
        assert!(!slot.deliver(frame(&[6; 8], 2, 2)));
        // Buffer is kept for reuse by the next session
        assert_eq!(slot.buffer_size().0, 8);
    }

    #[test]
    fn test_delivery_from_decoder_thread() {
        let slot = FrameSlot::new();
        slot.open();

        let producer = slot.clone();
        std::thread::spawn(move || {
            for value in 0..10u8 {
                producer.deliver(frame(&[value; 8], 2, 2));
            }
        })
        .join()
        .unwrap();

        assert!(slot.is_ready());
        assert_eq!(slot.frame_bytes(), vec![0; 8]);
        assert_eq!(slot.counters(), (1, 9));
    }
}
