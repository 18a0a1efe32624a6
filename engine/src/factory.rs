//! Composition point handing out the engine instance
//!
//! The factory is owned by the host's composition root. It holds the video
//! settings and creates at most one [`VideoSource`], returning the same
//! shared instance on every later call.

use crate::texture::TextureTarget;
use crate::video::{MediaPipeline, NullSource, VideoSource};
use common::VideoSettings;
use std::sync::{Arc, Mutex};

/// Engine instance shared between the host's tick loop and UI handlers
pub type SharedVideo = Arc<Mutex<dyn VideoSource>>;

type PipelineBuilder =
    Box<dyn Fn(&VideoSettings, &TextureTarget) -> Option<MediaPipeline> + Send>;

pub struct VideoFactory {
    settings: VideoSettings,
    target: TextureTarget,
    builder: PipelineBuilder,
    instance: Option<SharedVideo>,
}

#[cfg(feature = "video")]
fn default_builder(settings: &VideoSettings, target: &TextureTarget) -> Option<MediaPipeline> {
    let backend = Box::new(crate::video::GstBackend::new());
    Some(
        MediaPipeline::new(backend, target.clone())
            .with_media_root(settings.media_root.clone())
            .with_plugin_path(settings.plugin_path.clone()),
    )
}

#[cfg(not(feature = "video"))]
fn default_builder(_settings: &VideoSettings, _target: &TextureTarget) -> Option<MediaPipeline> {
    log::warn!("Video support not compiled in, using null video");
    None
}

impl VideoFactory {
    pub fn new(settings: VideoSettings) -> Self {
        Self {
            settings,
            target: TextureTarget::default(),
            builder: Box::new(default_builder),
            instance: None,
        }
    }

    /// Replace how the engine is constructed
    pub fn with_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&VideoSettings, &TextureTarget) -> Option<MediaPipeline> + Send + 'static,
    {
        self.builder = Box::new(builder);
        self
    }

    /// Allocate textures on `target` instead of system memory
    pub fn with_target(mut self, target: TextureTarget) -> Self {
        self.target = target;
        self
    }

    pub fn settings(&self) -> &VideoSettings {
        &self.settings
    }

    /// Takes effect for an instance created afterwards
    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    /// Takes effect for an instance created afterwards
    pub fn set_num_loops(&mut self, num_loops: u32) {
        self.settings.num_loops = num_loops;
    }

    /// Return the engine instance, creating it on first use
    ///
    /// A disabled factory, a build without video support and a runtime that
    /// fails to initialize all yield a [`NullSource`].
    pub fn create_video(&mut self) -> SharedVideo {
        if let Some(instance) = &self.instance {
            return Arc::clone(instance);
        }

        let instance = self.build_instance();
        self.instance = Some(Arc::clone(&instance));
        instance
    }

    fn build_instance(&self) -> SharedVideo {
        if !self.settings.enabled {
            log::info!("Video disabled, using null video");
            return Arc::new(Mutex::new(NullSource));
        }

        let Some(mut pipeline) = (self.builder)(&self.settings, &self.target) else {
            return Arc::new(Mutex::new(NullSource));
        };

        if let Err(e) = pipeline.initialize() {
            log::error!("Falling back to null video: {}", e);
            return Arc::new(Mutex::new(NullSource));
        }

        pipeline.set_num_loops(self.settings.num_loops);
        log::debug!(
            "Created {} video (loops: {})",
            pipeline.name(),
            self.settings.num_loops
        );
        Arc::new(Mutex::new(pipeline))
    }
}
