use super::*;

#[test]
fn helpers_build_matching_variants() {
    assert!(matches!(AssemblyError::validation("x"), AssemblyError::Validation(m) if m == "x"));
    assert!(matches!(AssemblyError::render("r"), AssemblyError::Render(_)));
    assert!(matches!(
        AssemblyError::encoder_unavailable("no ffmpeg"),
        AssemblyError::EncoderUnavailable(_)
    ));
    assert!(matches!(
        AssemblyError::asset_decode(2, "bad png"),
        AssemblyError::AssetDecode { scene: 2, .. }
    ));
}

#[test]
fn decode_error_message_names_the_scene() {
    let msg = AssemblyError::asset_decode(4, "truncated").to_string();
    assert!(msg.contains("scene 4"), "{msg}");
    assert!(msg.contains("truncated"), "{msg}");
}

#[test]
fn only_cancelled_is_cancelled() {
    assert!(AssemblyError::Cancelled.is_cancelled());
    assert!(!AssemblyError::encode("boom").is_cancelled());
    assert!(!AssemblyError::audio_attach("no track").is_cancelled());
}

#[test]
fn anyhow_errors_convert_into_other() {
    let e: AssemblyError = anyhow::anyhow!("io went away").into();
    assert!(matches!(e, AssemblyError::Other(_)));
    assert_eq!(e.to_string(), "io went away");
}
