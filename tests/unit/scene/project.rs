use super::*;
use crate::assets::decode::solid_png;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "creative_assembly_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn normalizes_relative_paths() {
    assert_eq!(normalize_rel_path("./a//b\\c.png").unwrap(), "a/b/c.png");
    assert!(normalize_rel_path("/etc/passwd").is_err());
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("./").is_err());
    assert!(normalize_rel_path("").is_err());
}

#[test]
fn minimal_project_takes_defaults() {
    let json = r#"{ "title": "Mug", "scenes": [ { "image": "a.png" } ] }"#;
    let p = ProjectFile::from_reader(json.as_bytes()).unwrap();
    assert_eq!(p.transition, TransitionType::Fade);
    assert_eq!(p.captions, CaptionSettings::default());
    assert_eq!(p.scenes[0].view, ViewType::Outside);
    assert!(p.audio.is_none());
}

#[test]
fn unknown_fields_are_rejected() {
    let json = r#"{ "title": "Mug", "scenes": [], "fps": 60 }"#;
    assert!(matches!(
        ProjectFile::from_reader(json.as_bytes()),
        Err(AssemblyError::Validation(_))
    ));
}

#[test]
fn loads_model_from_disk() {
    let root = temp_dir("project_load");
    std::fs::create_dir_all(root.join("img")).unwrap();
    std::fs::write(root.join("img/a.png"), solid_png(2, 2, [255, 0, 0, 255])).unwrap();
    std::fs::write(root.join("img/b.png"), solid_png(2, 2, [0, 0, 255, 255])).unwrap();
    std::fs::write(root.join("img/b2.png"), solid_png(2, 2, [0, 255, 0, 255])).unwrap();
    std::fs::write(root.join("voice.pcm"), vec![0u8; 480]).unwrap();

    let p = ProjectFile {
        title: "Mug".to_owned(),
        script: "Hot coffee. Cold hands.".to_owned(),
        transition: TransitionType::Slide,
        captions: CaptionSettings::default(),
        scenes: vec![
            SceneEntry {
                image: "img/a.png".to_owned(),
                alternates: Vec::new(),
                view: ViewType::Outside,
            },
            SceneEntry {
                image: "img/b.png".to_owned(),
                alternates: vec!["img/b2.png".to_owned()],
                view: ViewType::Inside,
            },
        ],
        reference: ReferenceEntry {
            outside: Some("img/a.png".to_owned()),
            inside: None,
        },
        audio: Some("voice.pcm".to_owned()),
        caption_font: None,
    };
    let json = serde_json::to_string(&p).unwrap();
    let path = root.join("project.json");
    std::fs::write(&path, json).unwrap();

    let loaded = ProjectFile::from_path(&path).unwrap();
    assert_eq!(loaded, p);
    let model = loaded.into_model(&root).unwrap();
    assert_eq!(model.scene_count(), 2);
    assert_eq!(model.history_of(1).unwrap().len(), 2);
    assert_eq!(model.captions(), ["Hot coffee.", "Cold hands."]);
    assert_eq!(model.transition(), TransitionType::Slide);
    assert_eq!(model.audio().map(|a| a.pcm().len()), Some(480));
    assert!(model.reference_for(1).unwrap().is_some());
    assert!(loaded.caption_font_bytes(&root).unwrap().is_none());

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn missing_image_fails_to_load() {
    let root = temp_dir("project_missing");
    let p = ProjectFile::from_reader(
        r#"{ "title": "Mug", "scenes": [ { "image": "nope.png" } ] }"#.as_bytes(),
    )
    .unwrap();
    assert!(p.into_model(&root).is_err());
    let _ = std::fs::remove_dir_all(&root);
}
