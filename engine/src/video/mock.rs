//! Scripted decode backend
//!
//! Stands in for the native runtime on machines without a media stack. The
//! paired [`MockHandle`] plays the decoder's role: it pushes frames through
//! the same [`FrameSlot`] a real decoder thread would use and queues bus
//! events for the engine to pop.

use super::backend::{BusEvent, DecodeBackend};
use super::frames::{DecodedFrame, FrameSlot};
use common::{BYTES_PER_PIXEL, VideoError};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

#[derive(Debug, Default)]
struct MockState {
    runtime_up: bool,
    runtime_inits: u32,
    frames: Option<FrameSlot>,
    running: bool,
    uri: Option<Url>,
    events: VecDeque<BusEvent>,
    builds: u32,
    stops: u32,
    seeks: u32,
    teardowns: u32,
    fail_init: bool,
    fail_build: bool,
    fail_play: bool,
}

/// Backend half, owned by the engine
#[derive(Debug)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

/// Decoder half, kept by the caller
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockBackend {
    pub fn new() -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockHandle { state },
        )
    }
}

impl DecodeBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn init_runtime(&mut self, _plugin_path: Option<&Path>) -> Result<(), VideoError> {
        let mut state = lock(&self.state);
        if state.fail_init {
            return Err(VideoError::Initialization("scripted failure".to_string()));
        }
        state.runtime_up = true;
        state.runtime_inits += 1;
        Ok(())
    }

    fn deinit_runtime(&mut self) -> Result<(), VideoError> {
        lock(&self.state).runtime_up = false;
        Ok(())
    }

    fn is_built(&self) -> bool {
        lock(&self.state).frames.is_some()
    }

    fn build(&mut self, frames: FrameSlot) -> Result<(), VideoError> {
        let mut state = lock(&self.state);
        if std::mem::take(&mut state.fail_build) {
            return Err(VideoError::ElementConstruction(
                "scripted failure creating playbin".to_string(),
            ));
        }
        state.frames = Some(frames);
        state.builds += 1;
        Ok(())
    }

    fn play(&mut self, uri: &Url) -> Result<(), VideoError> {
        let mut state = lock(&self.state);
        if std::mem::take(&mut state.fail_play) {
            return Err(VideoError::StateTransition("scripted failure".to_string()));
        }
        state.uri = Some(uri.clone());
        state.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), VideoError> {
        let mut state = lock(&self.state);
        state.running = false;
        state.stops += 1;
        Ok(())
    }

    fn pop_event(&mut self) -> Option<BusEvent> {
        lock(&self.state).events.pop_front()
    }

    fn seek_to_start(&mut self) -> Result<(), VideoError> {
        lock(&self.state).seeks += 1;
        Ok(())
    }

    fn teardown(&mut self) {
        let mut state = lock(&self.state);
        if state.frames.take().is_some() {
            state.teardowns += 1;
        }
        state.running = false;
    }
}

impl MockHandle {
    /// Deliver a tightly packed frame as the decoder thread would
    pub fn deliver(&self, data: &[u8], width: u32, height: u32) -> bool {
        self.deliver_with_stride(data, width, height, width as usize * BYTES_PER_PIXEL)
    }

    /// Deliver a frame whose rows are `stride` bytes apart
    pub fn deliver_with_stride(&self, data: &[u8], width: u32, height: u32, stride: usize) -> bool {
        // Clone the slot out so delivery does not hold the mock's own lock
        let Some(frames) = lock(&self.state).frames.clone() else {
            return false;
        };

        frames.deliver(DecodedFrame {
            data,
            width,
            height,
            stride,
        })
    }

    pub fn push_event(&self, event: BusEvent) {
        lock(&self.state).events.push_back(event);
    }

    pub fn fail_init(&self) {
        lock(&self.state).fail_init = true;
    }

    /// Make the next graph construction fail
    pub fn fail_next_build(&self) {
        lock(&self.state).fail_build = true;
    }

    /// Make the next transition to playing fail
    pub fn fail_next_play(&self) {
        lock(&self.state).fail_play = true;
    }

    pub fn elements_allocated(&self) -> bool {
        lock(&self.state).frames.is_some()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    pub fn runtime_up(&self) -> bool {
        lock(&self.state).runtime_up
    }

    pub fn runtime_inits(&self) -> u32 {
        lock(&self.state).runtime_inits
    }

    pub fn current_uri(&self) -> Option<Url> {
        lock(&self.state).uri.clone()
    }

    pub fn builds(&self) -> u32 {
        lock(&self.state).builds
    }

    pub fn stops(&self) -> u32 {
        lock(&self.state).stops
    }

    pub fn seeks(&self) -> u32 {
        lock(&self.state).seeks
    }

    pub fn teardowns(&self) -> u32 {
        lock(&self.state).teardowns
    }
}
