use super::*;
use crate::foundation::core::Rgba8;
use crate::motion::orbit::Direction;

const DOT_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="4"><rect width="8" height="4" fill="#fff"/></svg>"##;

fn assets_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kasu_cfg_{tag}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("dot.svg"), DOT_SVG).unwrap();
    dir
}

#[test]
fn defaults_fill_missing_fields() {
    let def: SceneDef = serde_json::from_str(
        r#"{ "center": { "image": "c.png" }, "ring_a": { "image": "r.svg" } }"#,
    )
    .unwrap();
    assert!(def.bg_color.is_none());
    assert!(def.ring_b.is_none());

    let center = def.center.as_ref().unwrap();
    assert_eq!(center.scale, 0.25);
    assert_eq!(center.rot_speed, 1.0);

    let ring = def.ring_a.as_ref().unwrap();
    assert_eq!(ring.count, 20);
    assert_eq!(ring.scale, 0.1);
    assert_eq!(ring.move_speed, 5.0);
    assert_eq!(ring.move_radius, 0.4);
    assert_eq!(ring.ellipse_ratio_speed, 0.5);
    assert_eq!(ring.move_angle, 0.0);

    assert_eq!(def.export, ExportDef::default());
    let job = def.export.to_job().unwrap();
    assert_eq!(job.total_frames(), 300);
    assert_eq!(job.size_px(), 2048);
}

#[test]
fn full_document_parses() {
    let def = SceneDef::from_reader(
        r##"{
            "bg_color": "#102030",
            "ring_b": { "image": "dot.svg", "count": 7, "move_angle": -30, "rot_speed": 0 },
            "export": { "duration_sec": 2, "fps": 24, "size": 10, "format": "webm" }
        }"##
            .as_bytes(),
    )
    .unwrap();
    assert_eq!(def.bg_color.unwrap().to_rgba8(), Rgba8::opaque(0x10, 0x20, 0x30));
    let job = def.export.to_job().unwrap();
    assert_eq!(job.size_px(), 64);
    assert_eq!(job.total_frames(), 48);
    assert_eq!(job.format(), ContainerFormat::Webm);
}

#[test]
fn unknown_and_malformed_input_is_a_serde_error() {
    let err = SceneDef::from_reader(r##"{ "bg": "#000" }"##.as_bytes()).unwrap_err();
    assert!(matches!(err, KasuError::Serde(_)));
    let err = SceneDef::from_reader("{".as_bytes()).unwrap_err();
    assert!(matches!(err, KasuError::Serde(_)));
}

#[test]
fn validate_enforces_control_ranges() {
    let with_ring = |ring: RingDef| SceneDef {
        ring_a: Some(ring),
        ..SceneDef::default()
    };
    assert!(with_ring(RingDef::default()).validate().is_ok());

    let bad = [
        RingDef {
            count: 0,
            ..RingDef::default()
        },
        RingDef {
            count: 101,
            ..RingDef::default()
        },
        RingDef {
            move_angle: 46.0,
            ..RingDef::default()
        },
        RingDef {
            move_speed: 61.0,
            ..RingDef::default()
        },
        RingDef {
            scale: 1.5,
            ..RingDef::default()
        },
        RingDef {
            rot_speed: -1.0,
            ..RingDef::default()
        },
    ];
    for ring in bad {
        assert!(with_ring(ring.clone()).validate().is_err(), "{ring:?}");
    }

    let bad_center = SceneDef {
        center: Some(CenterDef {
            scale: -0.1,
            ..CenterDef::default()
        }),
        ..SceneDef::default()
    };
    assert!(bad_center.validate().is_err());

    let bad_export = SceneDef {
        export: ExportDef {
            fps: 0,
            ..ExportDef::default()
        },
        ..SceneDef::default()
    };
    assert!(bad_export.validate().is_err());
}

#[test]
fn load_builds_the_scene() {
    let dir = assets_dir("load");
    let def = SceneDef {
        bg_color: Some(ColorDef::from(Rgba8::BLACK)),
        center: Some(CenterDef {
            image: Some("dot.svg".into()),
            ..CenterDef::default()
        }),
        ring_a: Some(RingDef {
            image: Some("dot.svg".into()),
            count: 3,
            move_angle: 30.0,
            ..RingDef::default()
        }),
        ring_b: Some(RingDef {
            image: Some("dot.svg".into()),
            ..RingDef::default()
        }),
        export: ExportDef::default(),
    };
    let scene = def.load(&dir).unwrap();

    assert_eq!(scene.base().unwrap().background, Rgba8::BLACK);
    assert_eq!(scene.center().unwrap().image().intrinsic_size(), (8.0, 4.0));
    let a = scene.ring_a().unwrap();
    assert_eq!(a.count(), 3);
    assert_eq!(a.tilt_deg(), 30.0);
    assert_eq!(a.direction(), Direction::Clockwise);
    assert_eq!(scene.ring_b().unwrap().direction(), Direction::Anticlockwise);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn objects_without_images_are_skipped() {
    let def = SceneDef {
        center: Some(CenterDef::default()),
        ring_a: Some(RingDef::default()),
        ..SceneDef::default()
    };
    let scene = def.load(Path::new(".")).unwrap();
    assert_eq!(scene, Scene::new());
}

#[test]
fn missing_image_file_is_an_error() {
    let def = SceneDef {
        center: Some(CenterDef {
            image: Some("does_not_exist.png".into()),
            ..CenterDef::default()
        }),
        ..SceneDef::default()
    };
    assert!(def.load(&std::env::temp_dir()).is_err());
}
