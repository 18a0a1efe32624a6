//! GStreamer pipeline setup and configuration
//!
//! The decode graph is a `playbin` whose video sink is a bin holding
//! `videoconvert ! appsink(YUY2)`, exposed through a ghost pad. Audio is
//! switched off through the playbin flags.

use super::backend::{BusEvent, DecodeBackend};
use super::frames::{DecodedFrame, FrameSlot};
use common::{FRAME_FORMAT, VideoError};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use std::path::Path;
use url::Url;

fn construction_error(stage: &str, e: impl std::fmt::Display) -> VideoError {
    let err = VideoError::ElementConstruction(format!("{}: {}", stage, e));
    log::debug!("Could not create {}", stage);
    err
}

/// Decode graph built on GStreamer's playbin
#[derive(Default)]
pub struct GstBackend {
    playbin: Option<gst::Element>,
    video_bin: Option<gst::Bin>,
    app_sink: Option<gst_app::AppSink>,
    bus: Option<gst::Bus>,
}

impl GstBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Configure AppSink for frame capture
///
/// - `sync=true`: frames are delivered at the media's own pace
/// - `qos=false`: no quality-of-service events back upstream
/// - `max-buffers=1`, `drop=true`: the decoder never piles up frames
pub fn configure_app_sink(app_sink: &gst_app::AppSink) {
    app_sink.set_property("sync", true);
    app_sink.set_property("qos", false);
    app_sink.set_property("max-buffers", 1u32);
    app_sink.set_property("drop", true);
}

/// Setup frame callback for AppSink
///
/// Runs on GStreamer's streaming thread and hands every sample to the slot,
/// which keeps or drops it without ever waiting on the render thread.
pub fn setup_frame_callback(app_sink: &gst_app::AppSink, frames: FrameSlot) {
    app_sink.set_callbacks(
        gst_app::AppSinkCallbacks::builder()
            .new_sample(move |sink| {
                let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;

                let info = sample
                    .caps()
                    .and_then(|caps| gst_video::VideoInfo::from_caps(caps).ok())
                    .ok_or(gst::FlowError::NotNegotiated)?;

                // Map buffer to read pixel data
                let map = buffer.map_readable().map_err(|_| gst::FlowError::Error)?;

                frames.deliver(DecodedFrame {
                    data: map.as_slice(),
                    width: info.width(),
                    height: info.height(),
                    stride: info.stride()[0].max(0) as usize,
                });

                Ok(gst::FlowSuccess::Ok)
            })
            .build(),
    );
}

impl DecodeBackend for GstBackend {
    fn name(&self) -> &'static str {
        "gstreamer"
    }

    fn init_runtime(&mut self, plugin_path: Option<&Path>) -> Result<(), VideoError> {
        gst::init().map_err(|e| VideoError::Initialization(e.to_string()))?;

        if let Some(dir) = plugin_path {
            let registry = gst::Registry::get();
            if registry.scan_path(dir) {
                log::info!("Loaded GStreamer plugins from {}", dir.display());
            } else {
                log::debug!("No new GStreamer plugins in {}", dir.display());
            }
        }

        log::info!("GStreamer initialized");
        Ok(())
    }

    fn deinit_runtime(&mut self) -> Result<(), VideoError> {
        self.teardown();
        // SAFETY: the graph was released above, and the engine refuses every
        // later initialize so no GStreamer object is created after this.
        unsafe { gst::deinit() };
        log::info!("GStreamer deinitialized");
        Ok(())
    }

    fn is_built(&self) -> bool {
        self.playbin.is_some()
    }

    fn build(&mut self, frames: FrameSlot) -> Result<(), VideoError> {
        // Elements created here are only stored once the whole graph is wired,
        // so any early return drops (and thereby releases) all of them.
        let playbin = gst::ElementFactory::make("playbin")
            .name("player")
            .build()
            .map_err(|e| construction_error("playbin", e))?;

        let video_bin = gst::Bin::builder().name("SinkBin").build();

        let convert = gst::ElementFactory::make("videoconvert")
            .name("video_convert")
            .build()
            .map_err(|e| construction_error("video converter", e))?;

        let caps = gst_video::VideoCapsBuilder::new()
            .format(gst_video::VideoFormat::Yuy2)
            .build();

        let app_sink = gst_app::AppSink::builder().caps(&caps).build();
        configure_app_sink(&app_sink);

        video_bin
            .add_many([&convert, app_sink.upcast_ref()])
            .map_err(|e| construction_error("video bin", e))?;

        gst::Element::link_many([&convert, app_sink.upcast_ref()])
            .map_err(|e| construction_error("video converter link", e))?;

        let convert_sink_pad = convert
            .static_pad("sink")
            .ok_or_else(|| construction_error("video convert sink pad", "missing"))?;

        let ghost_pad = gst::GhostPad::with_target(&convert_sink_pad)
            .map_err(|e| construction_error("video bin sink pad", e))?;

        video_bin
            .add_pad(&ghost_pad)
            .map_err(|e| construction_error("video bin sink pad", e))?;

        playbin.set_property("video-sink", &video_bin);
        playbin.set_property_from_str("flags", "video");

        let bus = playbin
            .bus()
            .ok_or_else(|| construction_error("message bus", "missing"))?;

        setup_frame_callback(&app_sink, frames);

        log::debug!(
            "GStreamer pipeline: playbin video-sink=\"videoconvert ! {} appsink\"",
            FRAME_FORMAT
        );

        self.playbin = Some(playbin);
        self.video_bin = Some(video_bin);
        self.app_sink = Some(app_sink);
        self.bus = Some(bus);
        Ok(())
    }

    fn play(&mut self, uri: &Url) -> Result<(), VideoError> {
        let playbin = self
            .playbin
            .as_ref()
            .ok_or_else(|| VideoError::StateTransition("pipeline not built".to_string()))?;

        // playbin only accepts a new URI from READY or NULL
        playbin
            .set_state(gst::State::Null)
            .map_err(|e| VideoError::StateTransition(e.to_string()))?;

        playbin.set_property("uri", uri.as_str());

        let change = playbin
            .set_state(gst::State::Playing)
            .map_err(|e| VideoError::StateTransition(format!("{:?}", e)))?;

        log::debug!("Pipeline state change result: {:?}", change);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), VideoError> {
        let Some(playbin) = self.playbin.as_ref() else {
            return Ok(());
        };

        log::debug!("Setting pipeline state to Null...");
        playbin
            .set_state(gst::State::Null)
            .map_err(|e| VideoError::StateTransition(e.to_string()))?;

        // Block until the streaming threads are gone
        let (result, current, pending) = playbin.state(gst::ClockTime::NONE);
        result.map_err(|e| VideoError::StateTransition(e.to_string()))?;

        log::debug!(
            "Pipeline final state: current={:?}, pending={:?}",
            current,
            pending
        );
        Ok(())
    }

    fn pop_event(&mut self) -> Option<BusEvent> {
        let bus = self.bus.as_ref()?;

        // Drain the chatter so the bus does not grow, stop at the first lifecycle message
        while let Some(msg) = bus.pop() {
            match msg.view() {
                gst::MessageView::Eos(_) => return Some(BusEvent::EndOfStream),
                gst::MessageView::Error(err) => {
                    return Some(BusEvent::Error(format!(
                        "{} (debug: {:?})",
                        err.error(),
                        err.debug()
                    )));
                }
                _ => {}
            }
        }

        None
    }

    fn seek_to_start(&mut self) -> Result<(), VideoError> {
        let playbin = self
            .playbin
            .as_ref()
            .ok_or_else(|| VideoError::StateTransition("pipeline not built".to_string()))?;

        playbin
            .seek_simple(gst::SeekFlags::FLUSH, gst::ClockTime::ZERO)
            .map_err(|e| VideoError::StateTransition(e.to_string()))
    }

    fn teardown(&mut self) {
        // Clear callbacks first to prevent new frames
        if let Some(app_sink) = self.app_sink.take() {
            app_sink.set_callbacks(gst_app::AppSinkCallbacks::builder().build());
        }

        if let Some(playbin) = self.playbin.take() {
            if let Err(e) = playbin.set_state(gst::State::Null) {
                log::warn!("Failed to set pipeline state to Null: {}", e);
            }
            log::debug!("Released GStreamer pipeline");
        }

        self.video_bin = None;
        self.bus = None;
    }
}

impl Drop for GstBackend {
    fn drop(&mut self) {
        self.teardown();
    }
}
