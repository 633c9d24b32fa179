use super::*;
use serde_json::json;

#[test]
fn parses_hex_forms() {
    assert_eq!(parse_color("#ff0000").unwrap(), Rgba8::opaque(255, 0, 0));
    assert_eq!(parse_color("#0f0").unwrap(), Rgba8::opaque(0, 255, 0));
    assert_eq!(parse_color("0000ff80").unwrap(), Rgba8::new(0, 0, 255, 128));
    assert!(parse_color("#12345").is_err());
    assert!(parse_color("#gg0000").is_err());
    assert!(parse_color("").is_err());
}

#[test]
fn parses_unit_objects_and_arrays() {
    let c: ColorDef = serde_json::from_value(json!({"r": 1.0, "g": 0.5, "b": 0.0})).unwrap();
    assert_eq!(c.to_rgba8(), Rgba8::opaque(255, 128, 0));

    let c: ColorDef = serde_json::from_value(json!([0.0, 0.0, 1.0, 0.5])).unwrap();
    assert_eq!(c.to_rgba8(), Rgba8::new(0, 0, 255, 128));

    assert!(serde_json::from_value::<ColorDef>(json!([0.0, 1.0])).is_err());
}

#[test]
fn parses_hsl_objects() {
    let red: ColorDef = serde_json::from_value(json!({"h": 0.0, "s": 1.0, "l": 0.5})).unwrap();
    assert_eq!(red.to_rgba8(), Rgba8::opaque(255, 0, 0));
    let blue: ColorDef =
        serde_json::from_value(json!({"h": -120.0, "s": 1.0, "l": 0.5, "a": 0.0})).unwrap();
    assert_eq!(blue.to_rgba8(), Rgba8::new(0, 0, 255, 0));
    let grey: ColorDef = serde_json::from_value(json!({"h": 200.0, "s": 0.0, "l": 0.5})).unwrap();
    assert_eq!(grey.to_rgba8(), Rgba8::opaque(128, 128, 128));
}

#[test]
fn serializes_as_hex_and_reads_back() {
    let c = ColorDef::from(Rgba8::new(1, 0xab, 0x10, 0xff));
    let v = serde_json::to_value(c).unwrap();
    assert_eq!(v, json!("#01ab10ff"));
    assert_eq!(serde_json::from_value::<ColorDef>(v).unwrap(), c);
}
