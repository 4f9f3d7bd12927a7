use super::*;
use crate::animation::lerp::AttrValue;
use crate::config::ChartConfig;
use crate::data::frame::FrameBuilder;
use crate::data::loader::DataSet;
use crate::foundation::core::{Canvas, Year};
use crate::render::backend::RecordingRenderer;

const M: &str = "healthExpPerCapita";

fn id(s: &str) -> EntityId {
    EntityId::from(s)
}

fn ctx() -> RenderContext {
    RenderContext::from_config(&ChartConfig::default(), &DataSet::default())
}

fn frame(year: i32, values: &[(&str, f64)]) -> Frame {
    let records: Vec<Record> = values
        .iter()
        .map(|(id, v)| Record::new(*id, Year(year)).with_metric(M, *v))
        .collect();
    FrameBuilder::new(M, Some(10)).build(Year(year), &records).0
}

fn ids(set: &BTreeSet<EntityId>) -> Vec<&str> {
    set.iter().map(EntityId::as_str).collect()
}

#[test]
fn partition_ignores_positions() {
    let mut engine = ReconciliationEngine::new();
    let mut ctx = ctx();
    engine.reconcile(&mut ctx, &frame(1970, &[("A", 3.0), ("B", 2.0), ("C", 1.0)]), Millis(0));

    let shuffled = frame(1971, &[("C", 30.0), ("A", 20.0), ("D", 10.0)]);
    let p = partition(engine.elements(), &shuffled);
    assert_eq!(ids(&p.entering), vec!["D"]);
    assert_eq!(ids(&p.updating), vec!["A", "C"]);
    assert_eq!(ids(&p.exiting), vec!["B"]);
    assert!(p.lingering.is_empty());
}

#[test]
fn reconciling_the_same_frame_twice_is_a_no_op() {
    let mut engine = ReconciliationEngine::new();
    let mut ctx = ctx();
    let mut r = RecordingRenderer::new();
    let f = frame(1970, &[("USA", 400.0), ("UK", 100.0)]);

    let first = engine.reconcile(&mut ctx, &f, Millis(0));
    assert_eq!(ids(&first.entering), vec!["UK", "USA"]);
    assert!(first.scheduled > 0);
    engine.tick(Millis(5_000), &mut r);

    let second = engine.reconcile(&mut ctx, &f, Millis(5_000));
    assert!(second.entering.is_empty());
    assert!(second.exiting.is_empty());
    assert_eq!(ids(&second.updating), vec!["UK", "USA"]);
    assert_eq!(second.scheduled, 0);

    let third = engine.reconcile(&mut ctx, &f, Millis(5_000));
    assert_eq!(third.scheduled, 0);
    assert!(engine.scheduler().is_empty());
}

#[test]
fn enter_update_exit_across_two_years() {
    let mut engine = ReconciliationEngine::new();
    let mut ctx = ctx();
    let mut r = RecordingRenderer::new();

    engine.reconcile(&mut ctx, &frame(1970, &[("USA", 400.0), ("UK", 100.0)]), Millis(0));
    engine.tick(Millis(0), &mut r);
    assert_eq!(r.creates().count(), 2);
    assert_eq!(engine.element(&id("USA")).unwrap().state, AnimationState::Entering);

    engine.tick(Millis(2_000), &mut r);
    assert_eq!(engine.element(&id("USA")).unwrap().state, AnimationState::Active);

    let report = engine.reconcile(
        &mut ctx,
        &frame(1971, &[("UK", 300.0), ("Japan", 200.0)]),
        Millis(2_000),
    );
    assert_eq!(ids(&report.entering), vec!["Japan"]);
    assert_eq!(ids(&report.updating), vec!["UK"]);
    assert_eq!(ids(&report.exiting), vec!["USA"]);
    assert_eq!(engine.element(&id("USA")).unwrap().state, AnimationState::Exiting);
    assert_eq!(engine.element(&id("UK")).unwrap().rank, 0);

    // The exit is still running: nothing is removed yet.
    let mid = engine.tick(Millis(2_500), &mut r);
    assert!(mid.removed.is_empty());
    assert!(r.live.contains_key(&id("USA")));

    let done = engine.tick(Millis(4_000), &mut r);
    assert_eq!(done.removed, vec![id("USA")]);
    assert_eq!(r.destroys().collect::<Vec<_>>(), vec![&id("USA")]);
    assert!(engine.element(&id("USA")).is_none());
    assert_eq!(
        r.live.keys().map(EntityId::as_str).collect::<Vec<_>>(),
        vec!["Japan", "UK"]
    );
}

#[test]
fn top_one_handover_from_usa_to_uk() {
    let mut engine = ReconciliationEngine::new();
    let mut ctx = ctx();
    let mut r = RecordingRenderer::new();
    let top_one = |year: i32, values: &[(&str, f64)]| {
        let records: Vec<Record> = values
            .iter()
            .map(|(id, v)| Record::new(*id, Year(year)).with_metric(M, *v))
            .collect();
        FrameBuilder::new(M, Some(1)).build(Year(year), &records).0
    };

    let first = engine.reconcile(&mut ctx, &top_one(1970, &[("USA", 10.0), ("UK", 5.0)]), Millis(0));
    assert_eq!(ids(&first.entering), vec!["USA"]);
    engine.tick(Millis(2_000), &mut r);
    assert_eq!(engine.elements().keys().collect::<Vec<_>>(), vec![&id("USA")]);

    let second = engine.reconcile(&mut ctx, &top_one(1971, &[("UK", 8.0)]), Millis(2_000));
    assert_eq!(ids(&second.entering), vec!["UK"]);
    assert_eq!(ids(&second.exiting), vec!["USA"]);
    assert!(second.updating.is_empty());

    let done = engine.tick(Millis(5_000), &mut r);
    assert_eq!(done.removed, vec![id("USA")]);
    assert_eq!(engine.elements().keys().collect::<Vec<_>>(), vec![&id("UK")]);
    assert_eq!(engine.element(&id("UK")).unwrap().state, AnimationState::Active);
    assert_eq!(r.live.keys().collect::<Vec<_>>(), vec![&id("UK")]);
}

#[test]
fn repeated_ids_in_a_frame_keep_the_first_record() {
    let mut engine = ReconciliationEngine::new();
    let mut ctx = ctx();
    let raw = Frame {
        year: Year(1970),
        metric: M.to_owned(),
        records: vec![
            Record::new("A", Year(1970)).with_metric(M, 10.0),
            Record::new("B", Year(1970)).with_metric(M, 5.0),
            Record::new("A", Year(1970)).with_metric(M, 1.0),
        ],
    };
    let clean = frame(1970, &[("A", 10.0), ("B", 5.0)]);

    let report = engine.reconcile(&mut ctx, &raw, Millis(0));
    assert_eq!(report.duplicates, vec![id("A")]);
    assert_eq!(ids(&report.entering), vec!["A", "B"]);

    let mut reference = ReconciliationEngine::new();
    let expected = reference.reconcile(&mut self::ctx(), &clean, Millis(0));
    assert_eq!(report.scheduled, expected.scheduled);

    let a = engine.element(&id("A")).unwrap();
    assert_eq!(a.rank, 0);
    assert_eq!(a.target, reference.element(&id("A")).unwrap().target);
    assert_eq!(engine.element(&id("B")).unwrap().rank, 1);
    assert_eq!(engine.last_frame(), Some(&clean));
}

#[test]
fn absent_exiting_elements_linger_without_rescheduling() {
    let mut engine = ReconciliationEngine::new();
    let mut ctx = ctx();
    let mut r = RecordingRenderer::new();
    engine.reconcile(&mut ctx, &frame(1970, &[("A", 2.0), ("B", 1.0)]), Millis(0));
    engine.tick(Millis(2_000), &mut r);

    let only_a = frame(1971, &[("A", 2.0)]);
    let first = engine.reconcile(&mut ctx, &only_a, Millis(2_000));
    assert_eq!(ids(&first.exiting), vec!["B"]);
    let pending = engine.scheduler().get(&id("B"), AttrKey::Opacity).cloned();

    let again = engine.reconcile(&mut ctx, &only_a, Millis(2_100));
    assert!(again.exiting.is_empty());
    assert_eq!(engine.scheduler().get(&id("B"), AttrKey::Opacity).cloned(), pending);
    assert!(partition(engine.elements(), &only_a).lingering.contains(&id("B")));
}

#[test]
fn reentry_mid_exit_resumes_from_the_current_value() {
    let mut engine = ReconciliationEngine::new();
    let mut ctx = ctx();
    let mut r = RecordingRenderer::new();
    let both = frame(1970, &[("A", 2.0), ("B", 1.0)]);

    engine.reconcile(&mut ctx, &both, Millis(0));
    engine.tick(Millis(2_000), &mut r);
    engine.reconcile(&mut ctx, &frame(1971, &[("A", 2.0)]), Millis(2_000));
    engine.tick(Millis(2_475), &mut r);

    let halfway = engine.element(&id("B")).unwrap().current.opacity;
    assert!(halfway > 0.0 && halfway < 1.0);

    let report = engine.reconcile(&mut ctx, &both, Millis(2_475));
    assert_eq!(ids(&report.updating), vec!["A", "B"]);
    assert!(report.entering.is_empty());
    assert_eq!(engine.len(), 2);

    let b = engine.element(&id("B")).unwrap();
    assert_eq!(b.state, AnimationState::Active);
    assert_eq!(b.current.opacity, halfway);
    let back = engine.scheduler().get(&id("B"), AttrKey::Opacity).unwrap();
    assert_eq!(back.from, AttrValue::Scalar(halfway));
    assert_eq!(back.to, AttrValue::Scalar(1.0));
    assert!(back.on_complete.is_none());

    let end = engine.tick(Millis(10_000), &mut r);
    assert!(end.removed.is_empty());
    assert_eq!(r.destroys().count(), 0);
    let b = engine.element(&id("B")).unwrap();
    assert_eq!((b.current.opacity, b.current.offset_x), (1.0, 0.0));
}

#[test]
fn stagger_delays_follow_rank() {
    let mut engine = ReconciliationEngine::new();
    let mut ctx = ctx();
    let values: Vec<(String, f64)> = (0..6).map(|i| (format!("E{i}"), 100.0 - i as f64)).collect();
    let values: Vec<(&str, f64)> = values.iter().map(|(s, v)| (s.as_str(), *v)).collect();
    engine.reconcile(&mut ctx, &frame(1970, &values), Millis(0));

    let delays: Vec<(usize, Millis)> = engine
        .scheduler()
        .ordered()
        .into_iter()
        .map(|t| (t.order, t.delay))
        .collect();
    assert!(delays.windows(2).all(|w| w[0].1 <= w[1].1));
    assert!(delays.iter().all(|(rank, d)| *d == Millis(75 * *rank as u64)));
}

#[test]
fn resize_retargets_without_changing_identity() {
    let mut engine = ReconciliationEngine::new();
    let mut ctx = ctx();
    let mut r = RecordingRenderer::new();
    engine.reconcile(&mut ctx, &frame(1970, &[("USA", 400.0), ("UK", 100.0)]), Millis(0));
    engine.tick(Millis(2_000), &mut r);
    let before: Vec<EntityId> = engine.elements().keys().cloned().collect();

    ctx.resize(Canvas {
        width: 1330,
        height: 500,
    });
    let report = engine.retarget(&mut ctx, Millis(2_000));
    assert!(report.entering.is_empty());
    assert!(report.exiting.is_empty());
    assert_eq!(report.updating.len(), 2);
    assert!(report.scheduled >= 2);

    engine.tick(Millis(5_000), &mut r);
    assert_eq!(engine.elements().keys().cloned().collect::<Vec<_>>(), before);
    assert_eq!(engine.element(&id("USA")).unwrap().current.width, 1200.0);
    assert_eq!(r.creates().count(), 2);
}

#[test]
fn exit_of_never_rendered_element_skips_destroy() {
    let mut engine = ReconciliationEngine::new();
    let mut ctx = ctx();
    let mut r = RecordingRenderer::new();
    engine.reconcile(&mut ctx, &frame(1970, &[("A", 1.0)]), Millis(0));
    engine.reconcile(&mut ctx, &frame(1971, &[("B", 1.0)]), Millis(0));

    let report = engine.tick(Millis(5_000), &mut r);
    assert_eq!(report.removed, vec![id("A")]);
    assert_eq!(r.destroys().count(), 0);
    assert_eq!(r.creates().collect::<Vec<_>>(), vec![&id("B")]);
}
