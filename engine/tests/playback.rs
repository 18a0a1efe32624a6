/// Integration tests for the playback engine
/// These drive MediaPipeline through the scripted backend, acting as the
/// decoder thread and the host's render loop at the same time
use common::{PlaybackState, VideoError, VideoSettings};
use engine::video::{BusEvent, MockBackend, MockHandle, find_media};
use engine::{MediaPipeline, NullSource, TextureTarget, VideoFactory, VideoSource, VideoTexture};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tempfile::NamedTempFile;

const TICK: f32 = 1.0 / 60.0;

fn engine() -> (MediaPipeline, MockHandle) {
    let _ = env_logger::builder().is_test(true).try_init();
    let (backend, handle) = MockBackend::new();
    let mut engine = MediaPipeline::new(Box::new(backend), TextureTarget::Cpu);
    engine.initialize().unwrap();
    (engine, handle)
}

fn video_file() -> NamedTempFile {
    let file = tempfile::Builder::new()
        .prefix("attract")
        .suffix(".mp4")
        .tempfile()
        .unwrap();
    std::fs::write(file.path(), b"not really a video").unwrap();
    file
}

#[test]
fn test_play_then_stop_clears_dimensions() {
    let (mut engine, handle) = engine();
    let file = video_file();

    engine.play(file.path()).unwrap();
    assert_eq!(engine.state(), PlaybackState::Playing);

    handle.deliver(&[16; 320 * 240 * 2], 320, 240);
    engine.update(TICK);
    assert_eq!((engine.width(), engine.height()), (320, 240));

    engine.stop().unwrap();
    assert_eq!(engine.state(), PlaybackState::Stopped);
    assert_eq!(engine.width(), 0);
    assert_eq!(engine.height(), 0);
    assert!(!engine.frames().is_ready());

    // Graph is kept for the next play
    assert!(handle.elements_allocated());
    assert!(!handle.is_running());
}

#[test]
fn test_no_frames_accepted_after_stop() {
    let (mut engine, handle) = engine();
    let file = video_file();

    engine.play(file.path()).unwrap();
    engine.stop().unwrap();

    assert!(!handle.deliver(&[0; 8], 2, 2));
    assert!(!engine.frames().is_ready());
}

#[test]
fn test_loop_limit_stops_seeking() {
    let (mut engine, handle) = engine();
    let file = video_file();
    engine.set_num_loops(3);
    engine.play(file.path()).unwrap();

    handle.push_event(BusEvent::EndOfStream);
    engine.update(TICK);
    assert_eq!(handle.seeks(), 1);

    handle.push_event(BusEvent::EndOfStream);
    engine.update(TICK);
    assert_eq!(handle.seeks(), 2);
    assert!(!engine.reached_end());

    handle.push_event(BusEvent::EndOfStream);
    engine.update(TICK);
    assert_eq!(handle.seeks(), 2);
    assert_eq!(engine.play_count(), 3);
    assert!(engine.reached_end());
}

#[test]
fn test_zero_loops_repeat_forever() {
    let (mut engine, handle) = engine();
    let file = video_file();
    engine.set_num_loops(0);
    engine.play(file.path()).unwrap();

    for expected in 1..=25 {
        handle.push_event(BusEvent::EndOfStream);
        engine.update(TICK);
        assert_eq!(handle.seeks(), expected);
    }
    assert!(!engine.reached_end());
}

#[test]
fn test_update_handles_one_message_per_tick() {
    let (mut engine, handle) = engine();
    let file = video_file();
    engine.play(file.path()).unwrap();

    handle.push_event(BusEvent::EndOfStream);
    handle.push_event(BusEvent::EndOfStream);

    engine.update(TICK);
    assert_eq!(handle.seeks(), 1);
    engine.update(TICK);
    assert_eq!(handle.seeks(), 2);
}

#[test]
fn test_play_resets_loop_counter() {
    let (mut engine, handle) = engine();
    let file = video_file();
    engine.set_num_loops(1);
    engine.play(file.path()).unwrap();

    handle.push_event(BusEvent::EndOfStream);
    engine.update(TICK);
    assert!(engine.reached_end());

    engine.play(file.path()).unwrap();
    assert_eq!(engine.play_count(), 0);
    assert!(!engine.reached_end());
}

#[test]
fn test_second_delivery_is_dropped_until_drawn() {
    let (mut engine, handle) = engine();
    let file = video_file();
    engine.play(file.path()).unwrap();

    assert!(handle.deliver(&[1; 8], 2, 2));
    assert!(!handle.deliver(&[2; 8], 2, 2));
    assert_eq!(engine.frames().frame_bytes(), vec![1; 8]);
    assert_eq!(engine.frames().counters(), (1, 1));

    // Update alone does not consume the frame
    engine.update(TICK);
    assert!(!handle.deliver(&[3; 8], 2, 2));

    engine.draw();
    assert!(handle.deliver(&[4; 8], 2, 2));
    engine.update(TICK);

    let Some(VideoTexture::Cpu(texture)) = engine.texture() else {
        panic!("expected a CPU texture");
    };
    assert_eq!(texture.pixels(), &[4; 8]);
}

#[test]
fn test_empty_path_fails_without_building() {
    let (mut engine, handle) = engine();

    let err = engine.play(Path::new("")).unwrap_err();
    assert!(matches!(err, VideoError::SourceResolution(_)));
    assert!(!handle.elements_allocated());
    assert_eq!(engine.state(), PlaybackState::Stopped);

    let file = video_file();
    assert!(engine.play(file.path()).is_ok());
    assert!(handle.elements_allocated());
}

#[test]
fn test_missing_file_fails_without_building() {
    let (mut engine, handle) = engine();
    let dir = tempfile::tempdir().unwrap();

    let err = engine.play(&dir.path().join("missing.mp4")).unwrap_err();
    assert!(matches!(err, VideoError::SourceResolution(_)));
    assert!(!handle.elements_allocated());
    assert_eq!(handle.builds(), 0);
}

#[test]
fn test_relative_path_resolves_against_media_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("snap")).unwrap();
    std::fs::write(dir.path().join("snap/galaga.mp4"), b"video").unwrap();

    let (backend, handle) = MockBackend::new();
    let mut engine = MediaPipeline::new(Box::new(backend), TextureTarget::Cpu)
        .with_media_root(Some(dir.path().to_path_buf()));
    engine.initialize().unwrap();

    engine.play(Path::new("snap/galaga.mp4")).unwrap();

    let uri = handle.current_uri().unwrap();
    assert_eq!(uri.scheme(), "file");
    assert!(uri.path().ends_with("/snap/galaga.mp4"));
}

#[test]
fn test_clip_found_by_name_plays() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("1942.MP4"), b"video").unwrap();

    let (mut engine, handle) = engine();
    let clip = find_media(dir.path(), "1942").unwrap();
    engine.play(&clip).unwrap();

    let uri = handle.current_uri().unwrap();
    assert!(uri.path().ends_with("/1942.MP4"));
}

#[test]
fn test_build_failure_rolls_back_and_retries() {
    let (mut engine, handle) = engine();
    let file = video_file();

    handle.fail_next_build();
    let err = engine.play(file.path()).unwrap_err();
    assert!(matches!(err, VideoError::ElementConstruction(_)));
    assert!(!handle.elements_allocated());
    assert_eq!(engine.state(), PlaybackState::Stopped);

    engine.play(file.path()).unwrap();
    assert_eq!(handle.builds(), 1);
    assert_eq!(engine.state(), PlaybackState::Playing);
}

#[test]
fn test_state_failure_tears_down_graph() {
    let (mut engine, handle) = engine();
    let file = video_file();

    handle.fail_next_play();
    let err = engine.play(file.path()).unwrap_err();
    assert!(matches!(err, VideoError::StateTransition(_)));
    assert!(!handle.elements_allocated());
    assert_eq!(handle.teardowns(), 1);
    assert_eq!(engine.state(), PlaybackState::Stopped);

    // Next play builds a fresh graph
    engine.play(file.path()).unwrap();
    assert_eq!(handle.builds(), 2);
    assert!(handle.is_running());
}

#[test]
fn test_frame_buffer_capacity_never_shrinks() {
    let (mut engine, handle) = engine();
    let file = video_file();
    let mut last_capacity = 0;

    for (width, height) in [(4, 4), (2, 2), (8, 8), (1, 1), (8, 8)] {
        engine.play(file.path()).unwrap();
        let frame = vec![0x80; width as usize * height as usize * 2];
        assert!(handle.deliver(&frame, width, height));

        let (len, capacity) = engine.frames().buffer_size();
        assert_eq!(len, frame.len());
        assert!(capacity >= len);
        assert!(capacity >= last_capacity);
        last_capacity = capacity;

        engine.update(TICK);
        engine.draw();
        engine.stop().unwrap();
    }

    assert!(last_capacity >= 8 * 8 * 2);
}

#[test]
fn test_frames_delivered_from_decoder_thread() {
    let (mut engine, handle) = engine();
    let file = video_file();
    engine.play(file.path()).unwrap();

    let decoder = {
        let handle = handle.clone();
        thread::spawn(move || {
            let mut kept = 0;
            for value in 0..50u8 {
                if handle.deliver(&[value; 16], 4, 2) {
                    kept += 1;
                }
            }
            kept
        })
    };

    let kept = decoder.join().unwrap();
    assert_eq!(kept, 1);

    engine.update(TICK);
    let Some(VideoTexture::Cpu(texture)) = engine.texture() else {
        panic!("expected a CPU texture");
    };
    assert_eq!(texture.pixels(), &[0; 16]);
    assert_eq!(engine.frames().counters(), (1, 49));
}

#[test]
fn test_concurrent_delivery_and_render_loop() {
    let (mut engine, handle) = engine();
    let file = video_file();
    engine.play(file.path()).unwrap();

    let decoder = {
        let handle = handle.clone();
        thread::spawn(move || {
            for value in 0..200u8 {
                handle.deliver(&[value; 8], 2, 2);
                thread::yield_now();
            }
        })
    };

    for _ in 0..200 {
        engine.update(TICK);
        engine.draw();
    }
    decoder.join().unwrap();
    engine.update(TICK);

    let (delivered, dropped) = engine.frames().counters();
    assert_eq!(delivered + dropped, 200);
    assert!(delivered >= 1);
    assert_eq!(engine.texture().map(VideoTexture::byte_size), Some(8));
}

#[test]
fn test_null_source_behaviour() {
    let mut source = NullSource;
    assert!(source.play(Path::new("anything.mp4")).is_ok());
    source.update(TICK);
    assert!(source.texture().is_none());
    assert_eq!((source.width(), source.height()), (0, 0));
}

#[test]
fn test_factory_hands_out_one_instance() {
    let mut factory = VideoFactory::new(VideoSettings::default()).with_builder(|_, target| {
        let (backend, _handle) = MockBackend::new();
        Some(MediaPipeline::new(Box::new(backend), target.clone()))
    });

    let first = factory.create_video();
    let second = factory.create_video();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_factory_instance_reports_end_of_media() {
    let mut factory = VideoFactory::new(VideoSettings {
        num_loops: 1,
        ..VideoSettings::default()
    })
    .with_builder(|_, target| {
        let (backend, handle) = MockBackend::new();
        handle.push_event(BusEvent::EndOfStream);
        Some(MediaPipeline::new(Box::new(backend), target.clone()))
    });
    let file = video_file();

    let video = factory.create_video();
    let mut video = video.lock().unwrap();
    video.play(file.path()).unwrap();
    assert!(!video.reached_end());

    video.update(TICK);
    assert!(video.reached_end());
    assert_eq!(video.state(), PlaybackState::Playing);
}

#[test]
fn test_disabled_factory_is_inert() {
    let settings = VideoSettings {
        enabled: false,
        ..VideoSettings::default()
    };
    let mut factory = VideoFactory::new(settings);

    let video = factory.create_video();
    let mut video = video.lock().unwrap();
    assert_eq!(video.name(), "null");
    assert!(video.play(Path::new("snap/dkong.mp4")).is_ok());
    assert!(video.texture().is_none());
    assert!(!video.reached_end());
}
