use super::*;

const CSV: &str = "\
name,year,healthExpPerCapita,lifeExpectancy
USA,1970,326,70.9
UK,1970,,71.9
Japan,1970,n/a,72
USA,1971,357,71.2
,1971,1,1
France,nineteen,1,1
UK,1971,90,72.1
";

#[test]
fn metric_value_flags_non_numeric_cells() {
    assert_eq!(MetricValue::parse(" 12.5 "), MetricValue::Number(12.5));
    assert_eq!(
        MetricValue::parse(""),
        MetricValue::Missing { raw: String::new() }
    );
    assert_eq!(
        MetricValue::parse("NaN"),
        MetricValue::Missing {
            raw: "NaN".to_owned()
        }
    );
    assert!(MetricValue::parse("abc").as_f64().is_none());
}

#[test]
fn csv_is_indexed_by_year_and_entity() {
    let ds = DataSet::from_reader(CSV.as_bytes(), &LoadOptions::default()).unwrap();

    assert_eq!(ds.year(Year(1970)).len(), 3);
    assert_eq!(ds.year(Year(1971)).len(), 2);
    assert!(ds.year(Year(1999)).is_empty());

    let usa = ds.entity(&EntityId::from("USA"));
    assert_eq!(
        usa.iter().map(|r| r.year).collect::<Vec<_>>(),
        vec![Year(1970), Year(1971)]
    );
    assert_eq!(usa[1].metric("healthExpPerCapita"), Some(357.0));

    let domain = ds.domain().unwrap();
    assert_eq!((domain.min, domain.max), (Year(1970), Year(1971)));
}

#[test]
fn unusable_rows_are_reported_not_fatal() {
    let ds = DataSet::from_reader(CSV.as_bytes(), &LoadOptions::default()).unwrap();
    let report = ds.report();
    assert_eq!(report.rows, 5);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].line, 6);
    assert!(report.skipped[1].reason.contains("nineteen"));
    // UK 1970 health (empty) and Japan 1970 health ("n/a").
    assert_eq!(report.missing_values, 2);
    assert_eq!(
        ds.year(Year(1970))[1].metric("healthExpPerCapita"),
        None
    );
}

#[test]
fn missing_key_column_is_a_validation_error() {
    let opts = LoadOptions {
        id_column: "country".to_owned(),
        ..LoadOptions::default()
    };
    let err = DataSet::from_reader(CSV.as_bytes(), &opts).unwrap_err();
    assert!(matches!(err, DataJoinError::Validation(_)));
}

#[test]
fn empty_dataset_is_a_data_error() {
    let err = DataSet::from_reader("name,year,x\n".as_bytes(), &LoadOptions::default())
        .unwrap_err();
    assert!(matches!(err, DataJoinError::Data(_)));
}

#[test]
fn metric_extent_skips_missing_values() {
    let ds = DataSet::from_reader(CSV.as_bytes(), &LoadOptions::default()).unwrap();
    assert_eq!(ds.metric_extent("healthExpPerCapita"), Some((90.0, 357.0)));
    assert_eq!(ds.metric_extent("nope"), None);
}
