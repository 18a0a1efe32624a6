//! Common types shared by the playback engine and its hosts.
//!
//! This crate defines the error taxonomy, the playback state machine, the
//! frame layout delivered to the host renderer, and the settings consulted
//! when the engine is created.
//!
//! # Frame layout
//!
//! Frames are handed to the host as packed YUY2 (4:2:2), two bytes per
//! pixel, ordered `Y0 U Y1 V` per macropixel, at the native decoded size.
//!
//! # Examples
//!
//! ```
//! use common::{VideoSettings, frame_size};
//!
//! let settings = VideoSettings::default();
//! assert!(settings.enabled);
//! assert_eq!(settings.num_loops, 0);
//! assert_eq!(frame_size(320, 240), 320 * 240 * 2);
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Bytes per pixel of the packed YUY2 layout.
pub const BYTES_PER_PIXEL: usize = 2;

/// Caps format string negotiated with the decoder.
pub const FRAME_FORMAT: &str = "YUY2";

/// Size in bytes of a tightly packed frame.
pub fn frame_size(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

/// Errors reported by video sources.
///
/// None of these are fatal to the process: the host is expected to skip the
/// media item and continue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VideoError {
    /// The decoding runtime could not start; fall back to a null source.
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// A pipeline stage could not be built; everything built so far was released.
    #[error("Element construction failed: {0}")]
    ElementConstruction(String),

    /// The path could not be turned into a playable locator.
    #[error("Source resolution failed: {0}")]
    SourceResolution(String),

    /// The pipeline refused to change state.
    #[error("State transition failed: {0}")]
    StateTransition(String),

    #[error("Decoding runtime is not initialized")]
    NotInitialized,

    #[error("Texture error: {0}")]
    Texture(String),
}

/// Playback state of a video source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// Settings consulted when the engine instance is created.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VideoSettings {
    /// Whether real playback is enabled at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Number of completions before looping stops (0 = loop forever)
    #[serde(default)]
    pub num_loops: u32,

    /// Base directory for relative media paths
    #[serde(default)]
    pub media_root: Option<PathBuf>,

    /// Extra decoder plugin directory scanned at initialization
    #[serde(default)]
    pub plugin_path: Option<PathBuf>,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            num_loops: 0,
            media_root: None,
            plugin_path: None,
        }
    }
}

fn default_true() -> bool {
    true
}
