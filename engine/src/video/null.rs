use super::source::VideoSource;
use crate::texture::VideoTexture;
use common::{PlaybackState, VideoError};
use std::path::Path;

/// Inert video source used when playback is disabled or unavailable
#[derive(Debug, Default)]
pub struct NullSource;

impl VideoSource for NullSource {
    fn name(&self) -> &'static str {
        "null"
    }

    fn initialize(&mut self) -> Result<(), VideoError> {
        Ok(())
    }

    fn play(&mut self, _path: &Path) -> Result<(), VideoError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), VideoError> {
        Ok(())
    }

    fn deinitialize(&mut self) -> Result<(), VideoError> {
        Ok(())
    }

    fn texture(&self) -> Option<&VideoTexture> {
        None
    }

    fn update(&mut self, _dt: f32) {}

    fn draw(&mut self) {}

    fn set_num_loops(&mut self, _num_loops: u32) {}

    fn reached_end(&self) -> bool {
        false
    }

    fn width(&self) -> u32 {
        0
    }

    fn height(&self) -> u32 {
        0
    }

    fn state(&self) -> PlaybackState {
        PlaybackState::Stopped
    }
}
