use super::*;
use crate::render::surface::render_scene;
use crate::scene::model::{CenterObject, RingObject, Scene};

const RED: [u8; 4] = [255, 0, 0, 255];
const TEAL: Rgba8 = Rgba8::opaque(0, 128, 128);

fn solid(w: u32, h: u32, px: [u8; 4]) -> ImageHandle {
    ImageHandle::from_rgba8(w, h, px.repeat((w * h) as usize)).unwrap()
}

/// Center object whose longer side is half the surface, spinning once every 4 s.
fn bar_scene(w: u32, h: u32) -> Scene {
    Scene::new().with_center(CenterObject::new(solid(w, h, RED), 0.5, 4.0).unwrap())
}

#[test]
fn surface_size_limits() {
    assert!(CpuSurface::new(0).is_err());
    assert!(CpuSurface::new(70_000).is_err());
    assert_eq!(CpuSurface::new(64).unwrap().size(), (64, 64));
}

#[test]
fn fill_covers_every_pixel() {
    let mut s = CpuSurface::new(16).unwrap();
    s.fill(TEAL).unwrap();
    let frame = s.snapshot().unwrap();
    assert!(frame.premultiplied);
    assert!(frame.data.chunks_exact(4).all(|px| px == [0, 128, 128, 255]));

    s.clear().unwrap();
    assert!(s.snapshot().unwrap().data.iter().all(|&b| b == 0));
}

#[test]
fn center_image_lands_in_the_middle() {
    let mut s = CpuSurface::new(64).unwrap();
    render_scene(&mut s, &bar_scene(4, 4), 0.0).unwrap();
    let frame = s.snapshot().unwrap();
    assert_eq!(frame.pixel(32, 32), RED);
    assert_eq!(frame.pixel(20, 20), RED);
    assert_eq!(frame.pixel(2, 2), [0, 0, 0, 0]);
    assert_eq!(frame.pixel(60, 33), [0, 0, 0, 0]);
}

#[test]
fn spin_rotates_about_the_placement_origin() {
    // A 4:1 bar, 32x8 px on a 64 px surface.
    let scene = bar_scene(4, 1);

    let mut s = CpuSurface::new(64).unwrap();
    render_scene(&mut s, &scene, 0.0).unwrap();
    let flat = s.snapshot().unwrap();
    assert_eq!(flat.pixel(44, 32), RED);
    assert_eq!(flat.pixel(32, 44), [0, 0, 0, 0]);

    // A quarter turn later the bar stands upright.
    let mut s = CpuSurface::new(64).unwrap();
    render_scene(&mut s, &scene, 1.0).unwrap();
    let upright = s.snapshot().unwrap();
    assert_eq!(upright.pixel(32, 44), RED);
    assert_eq!(upright.pixel(44, 32), [0, 0, 0, 0]);
}

#[test]
fn without_background_prior_pixels_survive_repeated_renders() {
    let scene = bar_scene(4, 4).with_ring_a(
        RingObject::new(solid(2, 2, [0, 0, 255, 255]), 6)
            .unwrap()
            .with_scale(0.05)
            .unwrap(),
    );

    let mut s = CpuSurface::new(128).unwrap();
    s.fill(TEAL).unwrap();
    render_scene(&mut s, &scene, 0.25).unwrap();
    render_scene(&mut s, &scene, 0.25).unwrap();
    let frame = s.snapshot().unwrap();
    for (x, y) in [(0, 0), (127, 0), (0, 127), (127, 127)] {
        assert_eq!(frame.pixel(x, y), [0, 128, 128, 255]);
    }
}

#[test]
fn background_paints_under_objects() {
    let scene = bar_scene(4, 4).with_background(TEAL);
    let mut s = CpuSurface::new(64).unwrap();
    render_scene(&mut s, &scene, 0.0).unwrap();
    let frame = s.snapshot().unwrap();
    assert_eq!(frame.pixel(0, 0), [0, 128, 128, 255]);
    assert_eq!(frame.pixel(32, 32), RED);
}

#[test]
fn rendering_is_deterministic() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20"><circle cx="5" cy="10" r="5" fill="#ffcc00"/></svg>"##;
    let star = ImageHandle::parse_svg(svg).unwrap();
    let scene = bar_scene(3, 2)
        .with_background(Rgba8::BLACK)
        .with_ring_b(RingObject::new(star, 12).unwrap().with_tilt_deg(30.0).unwrap());

    let render = |t: f64| {
        let mut s = CpuSurface::new(96).unwrap();
        render_scene(&mut s, &scene, t).unwrap();
        s.snapshot().unwrap()
    };
    let a = render(1.5);
    let b = render(1.5);
    assert_eq!(a, b);
    assert_ne!(a, render(1.6));
}

#[test]
fn transform_stack_restores() {
    let mut s = CpuSurface::new(8).unwrap();
    s.save();
    s.translate(Vec2::new(3.0, 4.0));
    s.rotate(1.0);
    s.restore();
    assert_eq!(s.transform, Affine::IDENTITY);
}

fn disc() -> ImageHandle {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><circle cx="8" cy="8" r="8" fill="#3366ff"/></svg>"##;
    ImageHandle::parse_svg(svg).unwrap()
}

#[test]
fn vector_paints_stay_bounded_across_sizes() {
    let image = disc();
    let mut s = CpuSurface::new(128).unwrap();
    for step in 5..=100 {
        let scale = f64::from(step) / 100.0;
        let center = CenterObject::new(image.clone(), scale, 0.0).unwrap();
        let scene = Scene::new().with_center(center);
        render_scene(&mut s, &scene, 0.0).unwrap();
        assert!(s.vector_cache.len() <= PAINT_CACHE_CAPACITY);
    }
    assert_eq!(s.cached_paints(), PAINT_CACHE_CAPACITY);
}

#[test]
fn recently_used_paint_survives_eviction() {
    let paint = || pixmap_paint(vello_cpu::Pixmap::new(1, 1));
    let mut cache = PaintCache::new(2);
    cache.insert(1_u64, paint());
    cache.insert(2, paint());
    assert!(cache.get(1).is_some());
    cache.insert(3, paint());
    assert_eq!(cache.len(), 2);
    assert!(cache.get(2).is_none());
    assert!(cache.get(1).is_some());
    assert!(cache.get(3).is_some());
}

#[test]
fn purge_drops_every_cached_paint() {
    let ring = RingObject::new(disc(), 3).unwrap().with_scale(0.1).unwrap();
    let scene = bar_scene(4, 4).with_ring_a(ring);
    let mut s = CpuSurface::new(64).unwrap();
    render_scene(&mut s, &scene, 0.0).unwrap();
    assert_eq!(s.cached_paints(), 2);
    s.purge_caches();
    assert_eq!(s.cached_paints(), 0);

    render_scene(&mut s, &scene, 0.0).unwrap();
    assert_eq!(s.cached_paints(), 2);
}
