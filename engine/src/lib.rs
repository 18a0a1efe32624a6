//! Attract-mode video playback engine
//!
//! Decodes a local video file into a YUY2 texture that a host renderer can
//! draw once per tick. Playback loops a configurable number of times and a
//! single shared engine instance is handed out by [`VideoFactory`].
//!
//! ```no_run
//! use common::VideoSettings;
//! use engine::VideoFactory;
//! use std::path::Path;
//!
//! let mut factory = VideoFactory::new(VideoSettings::default());
//! let video = factory.create_video();
//! let mut video = video.lock().unwrap();
//! video.play(Path::new("snap/pacman.mp4")).ok();
//! video.update(1.0 / 60.0);
//! video.draw();
//! ```

pub mod buffer;
pub mod factory;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod texture;
pub mod video;

pub use factory::{SharedVideo, VideoFactory};
pub use texture::{CpuTexture, TextureTarget, VideoTexture};
pub use video::{MediaPipeline, NullSource, VideoSource};
