use super::*;
use crate::assets::handle::ImageHandle;
use crate::foundation::core::Rgba8;
use crate::render::surface::render_scene;
use crate::scene::model::CenterObject;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct ManualClock(Rc<Cell<f64>>);

impl ManualClock {
    fn set(&self, ms: f64) {
        self.0.set(ms);
    }
}

impl ClockSource for ManualClock {
    fn now_ms(&self) -> f64 {
        self.0.get()
    }
}

#[test]
fn first_tick_is_the_epoch() {
    let mut clock = LiveClock::default();
    assert_eq!(clock.tick(5_000.0).t_secs, 0.0);
    assert_eq!(clock.tick(6_500.0).t_secs, 1.5);
}

#[test]
fn fps_estimate_is_two_tap_smoothed() {
    let mut clock = LiveClock::default();
    clock.tick(0.0);
    assert_eq!(clock.fps_estimate(), 0.0);
    clock.tick(10.0);
    assert_eq!(clock.fps_estimate(), 50.0);
    clock.tick(20.0);
    assert_eq!(clock.fps_estimate(), 75.0);
    // A repeated timestamp contributes nothing and halves the estimate.
    clock.tick(20.0);
    assert_eq!(clock.fps_estimate(), 37.5);
}

#[test]
fn fps_reported_at_most_once_per_interval() {
    let mut clock = LiveClock::new(0.5).unwrap();
    let reports: Vec<bool> = (0..=100)
        .map(|i| clock.tick(f64::from(i) * 10.0).fps_report.is_some())
        .collect();
    let at: Vec<usize> = reports
        .iter()
        .enumerate()
        .filter_map(|(i, &r)| r.then_some(i))
        .collect();
    assert_eq!(at, vec![50, 100]);
}

#[test]
fn reset_starts_a_new_epoch() {
    let mut clock = LiveClock::default();
    clock.tick(0.0);
    clock.tick(16.0);
    clock.reset();
    assert_eq!(clock.fps_estimate(), 0.0);
    assert_eq!(clock.tick(10_000.0).t_secs, 0.0);
    assert_eq!(clock.tick(10_250.0).t_secs, 0.25);
}

#[test]
fn negative_refresh_interval_is_rejected() {
    assert!(LiveClock::new(-1.0).is_err());
    assert!(LiveClock::new(f64::NAN).is_err());
}

#[test]
fn stale_tokens_are_ignored() {
    let source = ManualClock::default();
    let mut preview = LivePreview::new(source.clone(), LiveClock::default(), 32, Scene::new())
        .unwrap();
    let old = preview.start();
    source.set(100.0);
    assert!(preview.refresh(old).unwrap().is_some());

    let new = preview.set_scene(Scene::new().with_background(Rgba8::opaque(9, 8, 7)));
    assert_ne!(old, new);
    assert!(!preview.is_current(old));
    assert_eq!(preview.refresh(old).unwrap(), None);

    source.set(200.0);
    let frame = preview.refresh(new).unwrap().unwrap();
    assert_eq!(frame.token, new);
    assert_eq!(frame.t_secs, 0.0);
    assert_eq!(preview.frame().unwrap().pixel(0, 0), [9, 8, 7, 255]);
}

#[test]
fn live_frame_matches_sampled_render_at_same_t() {
    let scene = Scene::new().with_background(Rgba8::opaque(1, 2, 3));
    let source = ManualClock::default();
    let mut preview = LivePreview::new(source.clone(), LiveClock::default(), 24, scene.clone())
        .unwrap();
    let token = preview.start();
    source.set(1_000.0);
    preview.refresh(token).unwrap();
    source.set(1_750.0);
    let live = preview.refresh(token).unwrap().unwrap();
    assert_eq!(live.t_secs, 0.75);

    let mut surface = CpuSurface::new(24).unwrap();
    render_scene(&mut surface, &scene, 0.75).unwrap();
    assert_eq!(preview.frame().unwrap(), surface.snapshot().unwrap());
}

#[test]
fn resize_keeps_the_loop_running() {
    let mut preview =
        LivePreview::new(ManualClock::default(), LiveClock::default(), 16, Scene::new()).unwrap();
    let token = preview.start();
    preview.resize(48).unwrap();
    assert!(preview.is_current(token));
    assert_eq!(preview.frame().unwrap().width, 48);
    assert!(preview.resize(0).is_err());
}

#[test]
fn swapping_scenes_does_not_accumulate_paints() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><rect width="16" height="16" fill="#20a060"/></svg>"##;
    let image = ImageHandle::parse_svg(svg).unwrap();
    let source = ManualClock::default();
    let mut preview =
        LivePreview::new(source.clone(), LiveClock::default(), 128, Scene::new()).unwrap();
    for step in 1..=100 {
        let center = CenterObject::new(image.clone(), f64::from(step) / 100.0, 0.0).unwrap();
        let token = preview.set_scene(Scene::new().with_center(center));
        source.set(f64::from(step) * 16.0);
        preview.refresh(token).unwrap().unwrap();
        assert_eq!(preview.surface.cached_paints(), 1);
    }
}
