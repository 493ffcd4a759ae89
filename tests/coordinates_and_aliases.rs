mod common;

use common::{index, rows, selection};
use obsel::{Criteria, Quantity, SelectionError, Unit};

#[test]
fn sexagesimal_right_ascension_matches_degrees() {
    let sel = selection();
    let by_string = sel.preview_select(&Criteria::new().with("ra", "12h30m")).unwrap();
    let by_number = sel.preview_select(&Criteria::new().with("crval2", 187.5)).unwrap();
    let by_hours = sel.preview_select(&Criteria::new().with("ra", Quantity::hours(12.5))).unwrap();
    assert_eq!(rows(&by_string), vec![0, 1, 2]);
    assert_eq!(by_string, by_number);
    assert_eq!(by_string, by_hours);
}

#[test]
fn any_of_angles_on_coordinate_columns() {
    let mut sel = selection();
    let id = sel
        .select(Criteria::new().with("ra", vec!["12h30m", "10d"]))
        .unwrap()
        .unwrap();
    let rule = sel.rules().get(id).unwrap();
    assert_eq!(rows(rule.result()), vec![0, 1, 2, 3, 4]);
    assert_eq!(rule.criterion("CRVAL2"), Some("[187.5, 10]"));
    let by_quantity = sel
        .preview_select(&Criteria::new().with("dec", vec![Quantity::degrees(2.0), Quantity::degrees(-5.0)]))
        .unwrap();
    assert_eq!(rows(&by_quantity), vec![0, 1, 2, 3, 4]);
    // plain numbers are still a range in disguise
    let err = sel.select(Criteria::new().with("ra", vec![187.5, 10.0])).unwrap_err();
    assert!(matches!(err, SelectionError::MalformedValue { .. }));
    let err = sel.select(Criteria::new().with("exposure", vec![Quantity::degrees(1.0)])).unwrap_err();
    assert!(matches!(err, SelectionError::MalformedValue { .. }));
}

#[test]
fn within_accepts_quantities_in_mixed_units() {
    let sel = selection();
    let near = sel
        .preview_within(&Criteria::new().with("ra", (Quantity::degrees(187.5), Quantity::arcsec(36.0))))
        .unwrap();
    assert_eq!(rows(&near), vec![0, 1, 2]);
    let wide = sel
        .preview_within(&Criteria::new().with("ra", ("1h0m0s", Quantity::arcmin(600.0))))
        .unwrap();
    // 15 deg +- 10 deg
    assert_eq!(rows(&wide), vec![3, 4]);
}

#[test]
fn declination_range_from_angle_strings() {
    let mut sel = selection();
    sel.select_range(Criteria::new().with("dec", ("-6d", "0d"))).unwrap();
    let rule = sel.rules().get(0).unwrap();
    assert_eq!(rows(rule.result()), vec![3, 4]);
    assert_eq!(rule.criterion("CRVAL3"), Some("[-6, 0]"));
}

#[test]
fn invalid_angles_are_malformed() {
    let sel = selection();
    let err = sel.preview_select(&Criteria::new().with("ra", "north")).unwrap_err();
    assert!(matches!(err, SelectionError::MalformedValue { ref key, .. } if key == "CRVAL2"));
    let err = sel.preview_select(&Criteria::new().with("dec", "12.5")).unwrap_err();
    assert!(matches!(err, SelectionError::MalformedValue { .. }), "unitless strings are not angles");
    let ghz = Quantity::new(1.4, Unit::Other("GHz".into()));
    let err = sel.preview_select(&Criteria::new().with("ra", ghz)).unwrap_err();
    assert!(format!("{err}").contains("GHz"));
}

#[test]
fn galactic_aliases_share_the_coordinate_columns() {
    let sel = selection();
    let glon = sel.preview_select(&Criteria::new().with("glon", 10.0)).unwrap();
    let gallon = sel.preview_select(&Criteria::new().with("GALLON", "10d")).unwrap();
    assert_eq!(rows(&glon), vec![3, 4]);
    assert_eq!(glon, gallon);
    let glat = sel.preview_range(&Criteria::new().with("glat", ("30d30m", None::<f64>))).unwrap();
    assert_eq!(rows(&glat), vec![5, 6, 7, 8, 9]);
}

#[test]
fn default_aliases_skip_missing_columns() {
    let sel = selection();
    let aliases = sel.aliases();
    assert_eq!(aliases.get("source"), Some("OBJECT"));
    assert_eq!(aliases.get("POL"), Some("PLNUM"));
    // the fixture has neither CRVAL1 nor ELEVATIO
    assert_eq!(aliases.get("freq"), None);
    assert_eq!(aliases.get("elevation"), None);
    assert_eq!(aliases.aliases_of("crval2"), vec!["GALLON", "GLON", "RA"]);
}

#[test]
fn keys_are_case_insensitive_and_recorded_by_column() {
    let mut sel = selection();
    sel.select(Criteria::new().with("Source", "W3OH")).unwrap();
    let rule = sel.rules().get(0).unwrap();
    assert_eq!(rule.criteria()[0].0, "OBJECT");
    assert_eq!(rows(rule.result()), vec![5, 6]);
    let err = sel.select(Criteria::new().with("object", "W3OH")).unwrap_err();
    assert!(matches!(err, SelectionError::DuplicateRule { .. }));
}

#[test]
fn user_aliases() {
    let mut sel = selection();
    sel.alias("lon", "crval2").unwrap();
    sel.alias("t", "exposure").unwrap();
    // LON is not a coordinate name but CRVAL2 is
    let via_alias = sel.preview_range(&Criteria::new().with("lon", ("2h", "3h"))).unwrap();
    assert_eq!(rows(&via_alias), vec![5, 6]);
    let via_time = sel.preview_select(&Criteria::new().with("T", 10)).unwrap();
    assert_eq!(rows(&via_time), vec![9]);

    let err = sel.alias("foo", "bar").unwrap_err();
    assert_eq!(err, SelectionError::UnknownColumn("BAR".into()));
}

#[test]
fn aliases_can_be_redirected() {
    let mut sel = selection();
    sel.alias("pol", "ifnum").unwrap();
    let selected = sel.preview_select(&Criteria::new().with("pol", 1)).unwrap();
    assert_eq!(rows(&selected), vec![2, 3, 6, 7]);
}

#[test]
fn alias_all_is_all_or_nothing() {
    let mut sel = selection();
    let before = sel.aliases().len();
    let err = sel
        .alias_all([("a", "scan"), ("b", "nope"), ("c", "never")])
        .unwrap_err();
    assert_eq!(err, SelectionError::UnknownKey(vec!["NOPE".into(), "NEVER".into()]));
    assert_eq!(sel.aliases().len(), before);
    assert_eq!(sel.aliases().get("a"), None);

    sel.alias_all(vec![("a", "scan"), ("b", "ifnum")]).unwrap();
    assert_eq!(sel.aliases().len(), before + 2);
    assert_eq!(sel.aliases().resolve("b"), "IFNUM");
}

#[test]
fn coordinate_columns_are_configurable() {
    let mut settings = obsel::Settings::default();
    settings.coordinate_columns.push("EXPOSURE".into());
    let sel = obsel::Selection::with_settings(index(), settings).unwrap();
    let by_angle = sel.preview_select(&Criteria::new().with("exposure", "3d")).unwrap();
    assert_eq!(rows(&by_angle), vec![2]);
}
