use super::*;

#[test]
fn parses_rgb_and_rgba_hex() {
    assert_eq!(Rgba8::parse_hex("#FFFFFF").unwrap(), Rgba8::WHITE);
    assert_eq!(
        Rgba8::parse_hex("#102030f0").unwrap(),
        Rgba8 {
            r: 0x10,
            g: 0x20,
            b: 0x30,
            a: 0xF0
        }
    );
    assert_eq!(Rgba8::parse_hex("000000").unwrap(), Rgba8::BLACK);
}

#[test]
fn rejects_malformed_hex() {
    assert!(Rgba8::parse_hex("#FFF").is_err());
    assert!(Rgba8::parse_hex("#GG0000").is_err());
    assert!(Rgba8::parse_hex("#ÿÿÿÿÿÿ").is_err());
}

#[test]
fn hex_roundtrips_through_serde() {
    let c = Rgba8 {
        r: 1,
        g: 2,
        b: 3,
        a: 4,
    };
    let json = serde_json::to_string(&c).unwrap();
    assert_eq!(json, "\"#01020304\"");
    assert_eq!(serde_json::from_str::<Rgba8>(&json).unwrap(), c);
    assert_eq!(serde_json::to_string(&Rgba8::BLACK).unwrap(), "\"#000000\"");
}

#[test]
fn background_alpha_scaling() {
    let bg = Rgba8::BLACK.with_alpha_scaled(240);
    assert_eq!(bg.a, 240);
    let half = Rgba8::WHITE.with_alpha_scaled(128);
    assert_eq!(half.to_premul(), [128, 128, 128, 128]);
}
