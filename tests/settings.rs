mod common;

use std::fs;
use std::path::PathBuf;

use common::{index, rows};
use obsel::rule::generate_tag;
use obsel::{Criteria, Selection, SelectionError, Settings};

fn settings_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("obsel-{}-{name}.toml", std::process::id()));
    fs::write(&path, contents).expect("writable temp dir");
    path
}

#[test]
fn missing_file_gives_defaults() {
    let path = std::env::temp_dir().join("obsel-does-not-exist.toml");
    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.tag_length, 9);
    assert_eq!(settings.time_column, "DATE-OBS");
}

#[test]
fn file_overrides_defaults() {
    let path = settings_file(
        "override",
        r#"
tag_length = 12
coordinate_columns = ["RA", "DEC", "CRVAL2", "CRVAL3", "AZIMUTH"]

[aliases]
src = "object"
"#,
    );
    let settings = Settings::load(&path).unwrap();
    fs::remove_file(&path).ok();
    assert_eq!(settings.tag_length, 12);
    assert!(settings.is_coordinate("azimuth"));
    assert_eq!(settings.aliases.len(), 1);
    assert_eq!(settings.time_column, "DATE-OBS");

    let mut sel = Selection::with_settings(index(), settings).unwrap();
    assert_eq!(sel.aliases().get("src"), Some("OBJECT"));
    assert_eq!(sel.aliases().get("ra"), None);
    sel.select(Criteria::new().with("src", "3C286")).unwrap();
    let tag = sel.rules().get(0).unwrap().tag().to_string();
    assert_eq!(tag.len(), 12);
    assert_eq!(tag, generate_tag(["3C286"], 12));
}

#[test]
fn invalid_settings_are_refused() {
    let path = settings_file("zero", "tag_length = 0\n");
    let err = Settings::load(&path).unwrap_err();
    fs::remove_file(&path).ok();
    assert!(matches!(err, SelectionError::Config(_)));

    let too_long = Settings { tag_length: Settings::MAX_TAG_LENGTH + 1, ..Settings::default() };
    assert!(Selection::with_settings(index(), too_long).is_err());
    let no_time = Settings { time_column: " ".into(), ..Settings::default() };
    assert!(matches!(no_time.validate(), Err(SelectionError::Config(_))));
}

#[test]
fn full_length_tags() {
    let settings = Settings { tag_length: Settings::MAX_TAG_LENGTH, ..Settings::default() };
    let mut sel = Selection::with_settings(index(), settings).unwrap();
    sel.select(Criteria::new().with("scan", 4)).unwrap();
    assert_eq!(sel.rules().get(0).unwrap().tag().len(), 64);
}

#[test]
fn disallowed_characters_in_text_criteria() {
    let settings = Settings { disallowed_chars: "*?".into(), ..Settings::default() };
    let sel = Selection::with_settings(index(), settings).unwrap();
    let err = sel.preview_select(&Criteria::new().with("object", "3C*")).unwrap_err();
    assert!(matches!(err, SelectionError::MalformedValue { ref key, .. } if key == "OBJECT"));
    let err = sel
        .preview_select(&Criteria::new().with("object", vec!["3C273", "W3?H"]))
        .unwrap_err();
    assert!(matches!(err, SelectionError::MalformedValue { .. }));
    // coordinates are numbers by the time they are checked
    let ok = sel.preview_select(&Criteria::new().with("ra", "12h30m")).unwrap();
    assert_eq!(rows(&ok), vec![0, 1, 2]);
}
