use super::*;

const M: &str = "healthExpPerCapita";

fn rec(id: &str, v: f64) -> Record {
    Record::new(id, Year(1970)).with_metric(M, v)
}

fn ids(frame: &Frame) -> Vec<&str> {
    frame.ids().map(EntityId::as_str).collect()
}

#[test]
fn ranks_descending_and_truncates() {
    let records = vec![rec("A", 1.0), rec("B", 9.0), rec("C", 5.0), rec("D", 7.0)];
    let (frame, issues) = FrameBuilder::new(M, Some(3)).build(Year(1970), &records);
    assert!(issues.is_empty());
    assert_eq!(ids(&frame), vec!["B", "D", "C"]);
    assert_eq!(frame.max_value(), Some(9.0));
    assert_eq!(frame.rank_of(&EntityId::from("C")), Some(2));
    assert_eq!(frame.rank_of(&EntityId::from("A")), None);
}

#[test]
fn ties_break_by_entity_id() {
    let records = vec![rec("Zed", 3.0), rec("Amy", 3.0), rec("Max", 3.0)];
    let (frame, _) = FrameBuilder::new(M, None).build(Year(1970), &records);
    assert_eq!(ids(&frame), vec!["Amy", "Max", "Zed"]);
}

#[test]
fn missing_metric_is_excluded_before_ranking() {
    let mut missing = Record::new("X", Year(1970));
    missing.metrics.insert(
        M.to_owned(),
        crate::data::loader::MetricValue::Missing { raw: "".to_owned() },
    );
    let absent = Record::new("Y", Year(1970));
    let records = vec![missing, rec("A", 1.0), absent];

    let (frame, issues) = FrameBuilder::new(M, Some(10)).build(Year(1970), &records);
    assert_eq!(ids(&frame), vec!["A"]);
    assert_eq!(
        issues,
        vec![
            FrameIssue::MissingMetric {
                entity_id: EntityId::from("X")
            },
            FrameIssue::MissingMetric {
                entity_id: EntityId::from("Y")
            },
        ]
    );
}

#[test]
fn duplicate_identity_keeps_first_record() {
    let records = vec![rec("A", 1.0), rec("B", 2.0), rec("A", 50.0)];
    let (frame, issues) = FrameBuilder::new(M, None).build(Year(1970), &records);
    assert_eq!(ids(&frame), vec!["B", "A"]);
    assert_eq!(frame.value_at(1), Some(1.0));
    assert_eq!(
        issues,
        vec![FrameIssue::DuplicateIdentity {
            entity_id: EntityId::from("A")
        }]
    );
}

#[test]
fn empty_input_builds_empty_frame() {
    let (frame, issues) = FrameBuilder::new(M, Some(10)).build(Year(2000), &[]);
    assert!(frame.is_empty());
    assert!(issues.is_empty());
    assert_eq!(frame.max_value(), None);
}

#[test]
fn required_metrics_exclude_incomplete_records() {
    let records = vec![
        rec("A", 3.0).with_metric("lifeExpectancy", 70.0),
        rec("B", 5.0),
    ];
    let (frame, issues) = FrameBuilder::new(M, None)
        .requiring("lifeExpectancy")
        .build(Year(1970), &records);
    assert_eq!(ids(&frame), vec!["A"]);
    assert_eq!(
        issues,
        vec![FrameIssue::MissingMetric {
            entity_id: EntityId::from("B")
        }]
    );
}
