//! Video playback for attract-mode media
//!
//! The engine decodes one file at a time into a single-slot mailbox and
//! copies the newest frame into a texture on the render thread:
//!
//! - `backend`: the seam between the engine and a decode runtime
//! - `pipeline`: GStreamer graph (`playbin` + `videoconvert ! appsink`)
//! - `frames`: mailbox shared with the decoder's streaming thread
//! - `manager`: [`MediaPipeline`], the lifecycle and per-tick driver
//! - `stats`: delivery and upload counters
//! - `null`: inert source for disabled or unavailable playback
//!
//! # Threading
//!
//! Frames arrive on the decoder thread and only ever touch the mailbox.
//! Texture creation, uploads and bus handling happen in [`VideoSource::update`]
//! on the caller's thread. A frame that arrives while the previous one is
//! still pending is dropped.

mod backend;
mod frames;
mod locator;
mod manager;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod null;
#[cfg(feature = "video")]
mod pipeline;
mod source;
mod stats;

pub use backend::{BusEvent, DecodeBackend};
pub use frames::{DecodedFrame, FrameSlot};
pub use locator::{MEDIA_EXTENSIONS, find_media, resolve};
pub use manager::MediaPipeline;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBackend, MockHandle};
pub use null::NullSource;
#[cfg(feature = "video")]
pub use pipeline::GstBackend;
pub use source::VideoSource;
pub use stats::VideoStats;
