use super::*;
use crate::encode::sink::{ContainerFormat, InMemoryEncoder};
use crate::foundation::core::Rgba8;
use crate::foundation::error::KasuError;
use crate::scene::model::CenterObject;
use crate::assets::handle::ImageHandle;

fn scene() -> Scene {
    let img = ImageHandle::from_rgba8(2, 1, [200, 10, 10, 255].repeat(2)).unwrap();
    Scene::new()
        .with_background(Rgba8::opaque(0, 0, 40))
        .with_center(CenterObject::new(img, 0.5, 2.0).unwrap())
}

fn job(duration: f64, fps: u32) -> ExportJob {
    ExportJob::new(64, duration, fps, ContainerFormat::Mp4).unwrap()
}

#[test]
fn produces_floor_duration_times_fps_frames_at_k_over_fps() {
    let mut enc = InMemoryEncoder::new();
    let mut progress = Vec::new();
    let bytes = export_video(&scene(), &job(0.5, 8), &mut enc, |p| progress.push(p)).unwrap();

    assert_eq!(enc.frames().len(), 4);
    let times: Vec<f64> = enc.frames().iter().map(|(t, _)| *t).collect();
    assert_eq!(times, vec![0.0, 0.125, 0.25, 0.375]);
    assert_eq!(bytes.len(), 4 * 64 * 64 * 4);
    assert_eq!(
        progress.iter().map(|p| p.completed).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    assert!(progress.iter().all(|p| p.total == 4));
}

#[test]
fn frames_match_standalone_renders() {
    let mut enc = InMemoryEncoder::new();
    export_video(&scene(), &job(0.5, 4), &mut enc, |_| {}).unwrap();
    for (t, frame) in enc.frames() {
        let mut s = CpuSurface::new(64).unwrap();
        render_scene(&mut s, &scene(), *t).unwrap();
        assert_eq!(frame, &s.snapshot().unwrap());
    }
}

#[test]
fn encoder_failure_aborts_and_discards() {
    let mut enc = InMemoryEncoder::new().fail_at(2);
    let mut last = None;
    let err = export_video(&scene(), &job(1.0, 5), &mut enc, |p| last = Some(p)).unwrap_err();
    assert!(matches!(err, KasuError::Encode(_)));
    assert!(enc.was_aborted());
    assert!(enc.frames().is_empty());
    assert_eq!(last.map(|p| p.completed), Some(2));
}

#[test]
fn zero_duration_finishes_empty() {
    let mut enc = InMemoryEncoder::new();
    let bytes = export_video(&scene(), &job(0.0, 30), &mut enc, |_| {}).unwrap();
    assert!(bytes.is_empty());
    assert!(!enc.was_aborted());
}

#[test]
fn file_is_written_only_on_success() {
    let dir = std::env::temp_dir().join(format!("kasu_export_test_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();

    let mut failing = InMemoryEncoder::new().fail_at(0);
    let target = dir.join("fail.mp4");
    assert!(export_to_file(&scene(), &job(0.2, 10), &mut failing, &target, |_| {}).is_err());
    assert!(!target.exists());

    let mut enc = InMemoryEncoder::new();
    let written = export_to_file(&scene(), &job(0.2, 10), &mut enc, &dir, |_| {}).unwrap();
    assert_eq!(written, dir.join("kasu_video.mp4"));
    assert_eq!(std::fs::read(&written).unwrap().len(), 2 * 64 * 64 * 4);

    let _ = std::fs::remove_dir_all(&dir);
}
