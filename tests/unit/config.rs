use super::*;

#[test]
fn empty_json_is_the_default_bar_race() {
    let cfg: ChartConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, ChartConfig::default());
    assert!(cfg.validate().is_ok());
}

#[test]
fn partial_json_keeps_nested_defaults() {
    let cfg: ChartConfig = serde_json::from_str(
        r#"{ "kind": "scatter", "y_metric": "lifeExpectancy", "animation": { "stagger": 0 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.kind, ChartKind::Scatter);
    assert_eq!(cfg.animation.stagger, Millis::ZERO);
    assert_eq!(cfg.animation.duration, Millis(1000));
    assert!(cfg.validate().is_ok());
}

#[test]
fn scatter_preset_validates() {
    assert!(ChartConfig::scatter().validate().is_ok());
}

#[test]
fn invalid_configs_are_rejected() {
    let mut cfg = ChartConfig {
        top_n: Some(0),
        ..ChartConfig::default()
    };
    assert!(cfg.validate().is_err());

    cfg = ChartConfig {
        kind: ChartKind::Scatter,
        y_metric: None,
        ..ChartConfig::default()
    };
    assert!(cfg.validate().is_err());

    cfg = ChartConfig {
        period: Millis::ZERO,
        ..ChartConfig::default()
    };
    assert!(cfg.validate().is_err());

    cfg = ChartConfig::default();
    cfg.animation.active_opacity = 1.5;
    assert!(cfg.validate().is_err());
}

#[test]
fn from_path_reports_parse_errors_as_serde() {
    let dir = std::path::PathBuf::from("target").join("config_unit");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = ChartConfig::from_path(&path).unwrap_err();
    assert!(matches!(err, DataJoinError::Serde(_)));
}

#[test]
fn inverted_domain_does_not_load() {
    let err = serde_json::from_str::<ChartConfig>(r#"{ "domain": { "min": 2015, "max": 1970 } }"#)
        .unwrap_err();
    assert!(err.to_string().contains("min must be <= max"));

    let cfg: ChartConfig =
        serde_json::from_str(r#"{ "domain": { "min": 1970, "max": 1975 } }"#).unwrap();
    let d = cfg.domain.unwrap();
    assert!(cfg.validate().is_ok());
    let mut year = d.min;
    let mut seen = Vec::new();
    for _ in 0..7 {
        seen.push(year.0);
        year = d.next(year);
    }
    assert_eq!(seen, vec![1970, 1971, 1972, 1973, 1974, 1975, 1970]);
}

#[test]
fn validate_rejects_a_hand_built_inverted_domain() {
    let cfg = ChartConfig {
        domain: Some(YearDomain {
            min: crate::foundation::core::Year(2015),
            max: crate::foundation::core::Year(1970),
        }),
        ..ChartConfig::default()
    };
    assert!(matches!(cfg.validate(), Err(DataJoinError::Validation(_))));
}

#[test]
fn bar_race_needs_a_top_n() {
    let cfg = ChartConfig {
        top_n: None,
        ..ChartConfig::default()
    };
    assert!(cfg.validate().is_err());
    assert!(ChartConfig { top_n: None, ..ChartConfig::scatter() }.validate().is_ok());
}
