use std::collections::{BTreeMap, BTreeSet};

use crate::data::frame::Frame;
use crate::data::loader::Record;
use crate::engine::element::{AnimationState, VisualElement};
use crate::engine::scheduler::{OnComplete, Transition, TransitionScheduler};
use crate::foundation::core::{EntityId, Millis};
use crate::layout::context::{AttrKey, Attributes, Phase, RenderContext};
use crate::render::backend::Renderer;

/// Set-membership diff between the current visual set and a frame.
///
/// Elements that are already exiting and still absent from the frame are `lingering`: they
/// belong to none of the three join sets, so an unchanged frame always yields empty
/// `entering`/`exiting`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct JoinPartition {
    pub entering: BTreeSet<EntityId>,
    pub updating: BTreeSet<EntityId>,
    pub exiting: BTreeSet<EntityId>,
    pub lingering: BTreeSet<EntityId>,
}

/// Partition by entity id only; positions in `frame` never take part in identity.
pub fn partition(current: &BTreeMap<EntityId, VisualElement>, frame: &Frame) -> JoinPartition {
    let mut out = JoinPartition::default();
    let next: BTreeSet<&EntityId> = frame.ids().collect();

    for id in &next {
        if current.contains_key(*id) {
            out.updating.insert((*id).clone());
        } else {
            out.entering.insert((*id).clone());
        }
    }
    for (id, el) in current {
        if next.contains(id) {
            continue;
        }
        if el.is_exiting() {
            out.lingering.insert(id.clone());
        } else {
            out.exiting.insert(id.clone());
        }
    }
    out
}

/// Outcome of one reconciliation.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct JoinReport {
    pub entering: BTreeSet<EntityId>,
    pub updating: BTreeSet<EntityId>,
    pub exiting: BTreeSet<EntityId>,
    /// Later records of an id already placed in the frame; they were ignored.
    pub duplicates: Vec<EntityId>,
    /// Transitions created or replaced by this call.
    pub scheduled: usize,
}

/// Outcome of one engine tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub completed: usize,
    pub removed: Vec<EntityId>,
}

/// Keyed visual set plus the scheduler animating it.
#[derive(Clone, Debug, Default)]
pub struct ReconciliationEngine {
    elements: BTreeMap<EntityId, VisualElement>,
    scheduler: TransitionScheduler,
    last_frame: Option<Frame>,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &BTreeMap<EntityId, VisualElement> {
        &self.elements
    }

    pub fn element(&self, id: &EntityId) -> Option<&VisualElement> {
        self.elements.get(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements that are not on their way out, in rank order.
    pub fn live(&self) -> Vec<&VisualElement> {
        let mut out: Vec<&VisualElement> =
            self.elements.values().filter(|e| !e.is_exiting()).collect();
        out.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.id.cmp(&b.id)));
        out
    }

    pub fn scheduler(&self) -> &TransitionScheduler {
        &self.scheduler
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Diff `frame` against the visual set and schedule the resulting transitions.
    ///
    /// Prepares `ctx`'s frame-dependent domains first. Only the first record per id takes
    /// part; repeats are reported in [`JoinReport::duplicates`]. Nothing is removed here; exits
    /// finish through [`ReconciliationEngine::tick`].
    #[tracing::instrument(skip_all, fields(year = %frame.year, len = frame.len()))]
    pub fn reconcile(&mut self, ctx: &mut RenderContext, frame: &Frame, now: Millis) -> JoinReport {
        let (deduped, duplicates) = frame.dedup();
        for entity_id in &duplicates {
            tracing::warn!(year = %frame.year, %entity_id, "duplicate entity in frame, keeping first");
        }
        let frame: &Frame = &deduped;

        ctx.layout.prepare(frame);
        let join = partition(&self.elements, frame);
        let mut scheduled = 0usize;

        for (rank, rec) in frame.records.iter().enumerate() {
            let id = &rec.entity_id;
            if join.entering.contains(id) {
                let target = ctx.layout.target(rank, rec, &ctx.metric, Phase::Enter);
                let from = ctx.layout.enter_from(&target);
                for key in from.diff(&target) {
                    let t = transition(ctx, id, key, &from, &target, rank, now);
                    self.scheduler.schedule(
                        Transition {
                            on_complete: Some(OnComplete::EnterFinished),
                            ..t
                        },
                        now,
                    );
                    scheduled += 1;
                }
                self.elements.insert(
                    id.clone(),
                    VisualElement::entering(id.clone(), from, target, rank),
                );
            } else {
                scheduled += self.retarget_element(ctx, rank, rec, now);
            }
        }

        for id in &join.exiting {
            scheduled += self.begin_exit(ctx, id, now);
        }

        tracing::debug!(
            entering = join.entering.len(),
            updating = join.updating.len(),
            exiting = join.exiting.len(),
            lingering = join.lingering.len(),
            scheduled,
            "reconciled frame"
        );
        self.last_frame = Some(frame.clone());

        JoinReport {
            entering: join.entering,
            updating: join.updating,
            exiting: join.exiting,
            duplicates,
            scheduled,
        }
    }

    /// Re-run reconciliation against the last frame, e.g. after `ctx` was resized.
    pub fn retarget(&mut self, ctx: &mut RenderContext, now: Millis) -> JoinReport {
        match self.last_frame.take() {
            Some(frame) => self.reconcile(ctx, &frame, now),
            None => JoinReport::default(),
        }
    }

    fn retarget_element(
        &mut self,
        ctx: &RenderContext,
        rank: usize,
        rec: &Record,
        now: Millis,
    ) -> usize {
        let id = &rec.entity_id;
        let Some(el) = self.elements.get_mut(id) else {
            return 0;
        };

        if el.is_exiting() {
            // Re-entry mid-exit: continue from wherever the exit got to.
            for (key, v) in self.scheduler.cancel_element(id, now) {
                el.current.set(key, v);
            }
            el.target = el.current;
            tracing::debug!(%id, "element re-entered before its exit finished");
        }
        el.state = AnimationState::Active;
        el.rank = rank;

        let target = ctx.layout.target(rank, rec, &ctx.metric, Phase::Update);
        let instant = ctx.layout.instant_keys();
        for &key in instant {
            if el.current.get(key) != target.get(key) || el.target.get(key) != target.get(key) {
                self.scheduler.cancel(id, key, now);
                el.current.set(key, target.get(key));
            }
        }

        let changed: Vec<AttrKey> = el
            .target
            .diff(&target)
            .into_iter()
            .filter(|k| !instant.contains(k))
            .collect();
        let from = el.current;
        el.target = target;

        let mut scheduled = 0usize;
        for key in changed {
            let t = transition(ctx, id, key, &from, &target, rank, now);
            self.scheduler.schedule(t, now);
            scheduled += 1;
        }
        scheduled
    }

    fn begin_exit(&mut self, ctx: &RenderContext, id: &EntityId, now: Millis) -> usize {
        let Some(el) = self.elements.get_mut(id) else {
            return 0;
        };
        // Whatever was running freezes where it is.
        for (key, v) in self.scheduler.cancel_element(id, now) {
            el.current.set(key, v);
        }
        el.state = AnimationState::Exiting;
        el.target = ctx.layout.exit_to(&el.current);

        let from = el.current;
        let to = el.target;
        let order = el.rank;
        for &key in ctx.layout.exit_keys() {
            self.scheduler.schedule(
                Transition {
                    element_id: id.clone(),
                    attr: key,
                    from: from.get(key),
                    to: to.get(key),
                    start: now,
                    duration: ctx.timing.exit_duration,
                    delay: Millis::ZERO,
                    ease: ctx.timing.ease,
                    on_complete: Some(OnComplete::ExitFinished),
                    order,
                },
                now,
            );
        }
        ctx.layout.exit_keys().len()
    }

    /// Advance every transition to `now`, settle finished enters, remove finished exits and
    /// push the resulting attributes to `renderer` in rank order.
    pub fn tick(&mut self, now: Millis, renderer: &mut dyn Renderer) -> TickReport {
        let completions = self.scheduler.tick(now, &mut self.elements);
        let mut report = TickReport {
            completed: completions.len(),
            removed: Vec::new(),
        };

        for c in completions {
            let Some(action) = c.on_complete else {
                continue;
            };
            if self.scheduler.has_pending(&c.element_id) {
                continue;
            }
            let Some(el) = self.elements.get_mut(&c.element_id) else {
                continue;
            };
            match (action, el.state) {
                (OnComplete::EnterFinished, AnimationState::Entering) => {
                    el.state = AnimationState::Active;
                }
                (OnComplete::ExitFinished, AnimationState::Exiting) => {
                    if let Some(el) = self.elements.remove(&c.element_id)
                        && el.mounted
                    {
                        renderer.destroy(&el.id);
                    }
                    report.removed.push(c.element_id);
                }
                _ => {}
            }
        }

        let mut order: Vec<&mut VisualElement> = self.elements.values_mut().collect();
        order.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.id.cmp(&b.id)));
        for el in order {
            if el.mounted {
                renderer.update(&el.id, &el.current);
            } else {
                renderer.create(&el.id, &el.current);
                el.mounted = true;
            }
        }

        if !report.removed.is_empty() {
            tracing::debug!(removed = report.removed.len(), "exits finished");
        }
        report
    }
}

fn transition(
    ctx: &RenderContext,
    id: &EntityId,
    key: AttrKey,
    from: &Attributes,
    to: &Attributes,
    rank: usize,
    now: Millis,
) -> Transition {
    Transition {
        element_id: id.clone(),
        attr: key,
        from: from.get(key),
        to: to.get(key),
        start: now,
        duration: ctx.timing.duration,
        delay: ctx.timing.delay_for_rank(rank),
        ease: ctx.timing.ease,
        on_complete: None,
        order: rank,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/reconcile.rs"]
mod tests;
