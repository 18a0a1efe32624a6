use crate::texture::VideoTexture;
use common::{PlaybackState, VideoError};
use std::path::Path;

/// Capability contract shared by every playback engine.
///
/// The host calls [`VideoSource::update`] and then [`VideoSource::draw`]
/// once per render tick. `update` uploads a pending frame into the texture;
/// `draw` marks it consumed so the decoder may deliver the next one.
pub trait VideoSource: Send {
    /// Engine name used in logs
    fn name(&self) -> &'static str;

    /// Prepare the decoding runtime; calling it twice is harmless
    fn initialize(&mut self) -> Result<(), VideoError>;

    /// Start playing the file at `path`, resetting the loop counter
    fn play(&mut self, path: &Path) -> Result<(), VideoError>;

    /// Halt playback, blocking until the pipeline is idle
    fn stop(&mut self) -> Result<(), VideoError>;

    /// Release the decoding runtime
    fn deinitialize(&mut self) -> Result<(), VideoError>;

    /// Current render target, `None` until the first frame has been sized
    fn texture(&self) -> Option<&VideoTexture>;

    /// Per-tick pump; never blocks on the decoder
    fn update(&mut self, dt: f32);

    /// Mark the current frame as consumed
    fn draw(&mut self);

    /// Completions before looping stops, 0 loops forever
    fn set_num_loops(&mut self, num_loops: u32);

    /// Whether the loop limit was hit and the last frame is being held
    fn reached_end(&self) -> bool;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn state(&self) -> PlaybackState;
}
