//! MediaPipeline coordinating video playback
//!
//! This module ties a decode backend, the shared frame slot, the render
//! texture and loop bookkeeping together behind the [`VideoSource`] contract.

use super::backend::{BusEvent, DecodeBackend};
use super::frames::{FrameSlot, SlotState};
use super::locator;
use super::source::VideoSource;
use super::stats::VideoStats;
use crate::texture::{TextureTarget, VideoTexture, pack_rows};
use common::{BYTES_PER_PIXEL, PlaybackState, VideoError, frame_size};
use std::path::{Path, PathBuf};

/// Seconds of ticks between statistics log lines
const STATS_INTERVAL: f32 = 3.0;

/// Video playback engine backed by a decode pipeline
pub struct MediaPipeline {
    /// Native decode graph, built lazily on the first successful play
    backend: Box<dyn DecodeBackend>,

    /// Mailbox shared with the decoder thread
    frames: FrameSlot,

    /// Where render textures are allocated
    target: TextureTarget,

    /// Render texture, lives as long as the engine
    texture: Option<VideoTexture>,

    /// Repacking space for frames with padded rows
    scratch: Vec<u8>,

    stats: VideoStats,
    state: PlaybackState,
    initialized: bool,

    /// The runtime was shut down and cannot be started again in this process
    released: bool,

    /// End-of-stream events since the last play
    play_count: u32,

    /// Completions before looping stops (0 = forever)
    num_loops: u32,

    media_root: Option<PathBuf>,
    plugin_path: Option<PathBuf>,
    current_file: Option<PathBuf>,
}

impl MediaPipeline {
    pub fn new(backend: Box<dyn DecodeBackend>, target: TextureTarget) -> Self {
        Self {
            backend,
            frames: FrameSlot::new(),
            target,
            texture: None,
            scratch: Vec::new(),
            stats: VideoStats::new(),
            state: PlaybackState::Stopped,
            initialized: false,
            released: false,
            play_count: 0,
            num_loops: 0,
            media_root: None,
            plugin_path: None,
            current_file: None,
        }
    }

    /// Base directory for relative media paths
    pub fn with_media_root(mut self, media_root: Option<PathBuf>) -> Self {
        self.media_root = media_root;
        self
    }

    /// Extra plugin directory scanned when the runtime starts
    pub fn with_plugin_path(mut self, plugin_path: Option<PathBuf>) -> Self {
        self.plugin_path = plugin_path;
        self
    }

    /// Handle to the frame mailbox shared with the decoder
    pub fn frames(&self) -> &FrameSlot {
        &self.frames
    }

    pub fn num_loops(&self) -> u32 {
        self.num_loops
    }

    /// End-of-stream events seen since the last play
    pub fn play_count(&self) -> u32 {
        self.play_count
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    fn handle_bus(&mut self) {
        let Some(event) = self.backend.pop_event() else {
            return;
        };

        match event {
            BusEvent::EndOfStream => {
                self.play_count += 1;
                self.stats.record_loop();

                if self.num_loops == 0 || self.play_count < self.num_loops {
                    log::debug!("Video reached EOS ({}), looping...", self.play_count);
                    if let Err(e) = self.backend.seek_to_start() {
                        log::warn!("Failed to seek to start: {}", e);
                    }
                } else {
                    log::info!(
                        "Video playback finished after {} loop(s)",
                        self.play_count
                    );
                }
            }

            BusEvent::Error(message) => {
                log::error!("Pipeline error: {}", message);
                if let Err(e) = self.stop() {
                    log::warn!("Failed to stop pipeline after error: {}", e);
                }
            }
        }
    }
}

/// Copy the pending frame into `texture`, repacking padded rows if needed
fn upload_frame(
    texture: &mut VideoTexture,
    slot: &SlotState,
    scratch: &mut Vec<u8>,
) -> Result<(), VideoError> {
    let row = slot.width as usize * BYTES_PER_PIXEL;
    let size = frame_size(slot.width, slot.height);
    let data = slot.buffer.as_slice();

    if slot.stride > row {
        pack_rows(data, slot.width, slot.height, slot.stride, scratch);
        texture.upload(scratch)
    } else if data.len() >= size {
        texture.upload(&data[..size])
    } else {
        Err(VideoError::Texture(format!(
            "Frame holds {} bytes, {}x{} needs {}",
            data.len(),
            slot.width,
            slot.height,
            size
        )))
    }
}

impl VideoSource for MediaPipeline {
    fn name(&self) -> &'static str {
        self.backend.name()
    }

    fn initialize(&mut self) -> Result<(), VideoError> {
        if self.initialized {
            return Ok(());
        }

        if self.released {
            log::error!(
                "{} runtime cannot be restarted once deinitialized",
                self.backend.name()
            );
            return Err(VideoError::Initialization(
                "runtime was already deinitialized".to_string(),
            ));
        }

        self.backend
            .init_runtime(self.plugin_path.as_deref())
            .inspect_err(|e| log::error!("Failed to initialize {}: {}", self.backend.name(), e))?;

        self.initialized = true;
        log::info!("{} decoding runtime initialized", self.backend.name());
        Ok(())
    }

    fn play(&mut self, path: &Path) -> Result<(), VideoError> {
        self.play_count = 0;

        if !self.initialized {
            log::warn!("Cannot play {}: runtime not initialized", path.display());
            return Err(VideoError::NotInitialized);
        }

        let uri = locator::resolve(path, self.media_root.as_deref())
            .inspect_err(|e| log::warn!("Cannot play {}: {}", path.display(), e))?;

        if self.state == PlaybackState::Playing {
            log::debug!("Stopping current video before playing {}", path.display());
            self.stop()?;
        }

        if !self.backend.is_built() {
            log::info!("Creating {} pipeline", self.backend.name());
            self.backend
                .build(self.frames.clone())
                .inspect_err(|e| log::error!("Failed to build pipeline: {}", e))?;
        }

        self.frames.open();
        self.stats.reset();

        if let Err(e) = self.backend.play(&uri) {
            log::error!("Unable to set the pipeline to the playing state: {}", e);
            self.frames.close();
            self.backend.teardown();
            self.state = PlaybackState::Stopped;
            return Err(e);
        }

        log::info!("Playing video: {}", uri);
        self.current_file = Some(path.to_path_buf());
        self.state = PlaybackState::Playing;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), VideoError> {
        if !self.initialized {
            return Err(VideoError::NotInitialized);
        }

        // Close first so a callback racing the state change drops its frame
        self.frames.close();
        self.state = PlaybackState::Stopped;

        if self.backend.is_built() {
            self.backend
                .stop()
                .inspect_err(|e| log::warn!("Failed to stop pipeline: {}", e))?;
        }

        // Anything delivered before the pipeline went idle is discarded too
        self.frames.close();
        Ok(())
    }

    fn deinitialize(&mut self) -> Result<(), VideoError> {
        if self.backend.is_built() {
            if self.state == PlaybackState::Playing {
                let _ = self.stop();
            }
            self.backend.teardown();
        }

        self.initialized = false;
        self.released = true;
        self.backend
            .deinit_runtime()
            .inspect_err(|e| log::warn!("Failed to deinitialize runtime: {}", e))
    }

    fn texture(&self) -> Option<&VideoTexture> {
        self.texture.as_ref()
    }

    fn update(&mut self, dt: f32) {
        {
            let mut slot = self.frames.lock();

            // Same byte size but a different shape still needs a new texture
            if let Some(texture) = &self.texture
                && slot.width != 0
                && (texture.width(), texture.height()) != (slot.width, slot.height)
            {
                slot.texture_valid = false;
            }

            if !slot.texture_valid && self.texture.take().is_some() {
                log::debug!("Dropped stale video texture");
            }

            if self.texture.is_none() && slot.width != 0 && slot.height != 0 {
                match self.target.create(slot.width, slot.height) {
                    Ok(texture) => {
                        log::debug!("Created {}x{} video texture", slot.width, slot.height);
                        self.texture = Some(texture);
                        slot.texture_valid = true;
                    }
                    Err(e) => log::error!("Failed to create video texture: {}", e),
                }
            }

            if let Some(texture) = self.texture.as_mut()
                && slot.ready
                && !slot.buffer.is_empty()
                && slot.width != 0
                && slot.height != 0
            {
                match upload_frame(texture, &slot, &mut self.scratch) {
                    Ok(()) => self.stats.record_upload(),
                    Err(e) => log::warn!("Failed to upload video frame: {}", e),
                }
            }
        }

        self.handle_bus();

        let (delivered, dropped) = self.frames.counters();
        self.stats
            .maybe_log_stats(dt, STATS_INTERVAL, delivered, dropped);
    }

    fn draw(&mut self) {
        self.frames.consume();
    }

    fn set_num_loops(&mut self, num_loops: u32) {
        self.num_loops = num_loops;
    }

    fn reached_end(&self) -> bool {
        self.num_loops != 0 && self.play_count >= self.num_loops
    }

    fn width(&self) -> u32 {
        self.frames.dimensions().0
    }

    fn height(&self) -> u32 {
        self.frames.dimensions().1
    }

    fn state(&self) -> PlaybackState {
        self.state
    }
}

impl Drop for MediaPipeline {
    fn drop(&mut self) {
        log::debug!("MediaPipeline::drop - stopping pipeline and releasing elements");

        if self.initialized && self.state == PlaybackState::Playing {
            let _ = self.stop();
        }
        self.backend.teardown();

        log::debug!(
            "MediaPipeline::drop - released (uploaded: {}, loops: {})",
            self.stats.frames_uploaded,
            self.stats.loops_completed
        );
    }
}
