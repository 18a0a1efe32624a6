//! Seam between the engine and the native decoding runtime

use super::frames::FrameSlot;
use common::VideoError;
use std::path::Path;
use url::Url;

/// Lifecycle notifications popped from the pipeline's message bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    EndOfStream,
    Error(String),
}

/// A decode graph the engine can drive.
///
/// Implementations deliver frames from their own thread through the
/// [`FrameSlot`] handed to [`DecodeBackend::build`] and must never block on
/// the render thread while doing so.
pub trait DecodeBackend: Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Start the decoding runtime, optionally scanning an extra plugin directory
    fn init_runtime(&mut self, plugin_path: Option<&Path>) -> Result<(), VideoError>;

    /// Shut the decoding runtime down
    fn deinit_runtime(&mut self) -> Result<(), VideoError>;

    /// Whether the decode graph currently exists
    fn is_built(&self) -> bool;

    /// Construct the decode graph and wire frame delivery into `frames`.
    ///
    /// On failure everything created so far is released and the backend is
    /// left unbuilt.
    fn build(&mut self, frames: FrameSlot) -> Result<(), VideoError>;

    /// Point the source at `uri` and request the playing state
    fn play(&mut self, uri: &Url) -> Result<(), VideoError>;

    /// Drive the graph to idle, blocking until the runtime confirms it
    fn stop(&mut self) -> Result<(), VideoError>;

    /// Next lifecycle event, if any is pending
    fn pop_event(&mut self) -> Option<BusEvent>;

    /// Flushing seek back to the start of the media
    fn seek_to_start(&mut self) -> Result<(), VideoError>;

    /// Release the decode graph
    fn teardown(&mut self);
}
