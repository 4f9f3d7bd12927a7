use std::collections::BTreeMap;

use crate::animation::ease::Ease;
use crate::animation::lerp::{AttrValue, Lerp};
use crate::engine::element::VisualElement;
use crate::foundation::core::{EntityId, Millis};
use crate::layout::context::AttrKey;

/// Follow-up interpreted by the engine once a transition finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum OnComplete {
    /// Part of an enter; the element settles once its last enter transition ends.
    EnterFinished,
    /// Part of an exit; the element is removed once its last exit transition ends.
    ExitFinished,
}

/// Timed interpolation of one attribute of one element.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Transition {
    pub element_id: EntityId,
    pub attr: AttrKey,
    pub from: AttrValue,
    pub to: AttrValue,
    pub start: Millis,
    pub duration: Millis,
    pub delay: Millis,
    pub ease: Ease,
    pub on_complete: Option<OnComplete>,
    /// Tick ordering key: frame rank of the owning element.
    pub order: usize,
}

impl Transition {
    /// When interpolation actually begins.
    pub fn begins_at(&self) -> Millis {
        self.start.saturating_add(self.delay)
    }

    pub fn has_started(&self, now: Millis) -> bool {
        now >= self.begins_at()
    }

    /// Normalized, un-eased progress at `now`. A zero duration jumps to 1 once started.
    pub fn progress(&self, now: Millis) -> f64 {
        let begin = self.begins_at();
        if now < begin {
            return 0.0;
        }
        if self.duration.0 == 0 {
            return 1.0;
        }
        ((now.0 - begin.0) as f64 / self.duration.0 as f64).clamp(0.0, 1.0)
    }

    pub fn value_at(&self, now: Millis) -> AttrValue {
        let t = self.ease.apply(self.progress(now));
        AttrValue::lerp(&self.from, &self.to, t)
    }
}

/// A transition that reached `t >= 1` during a tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub element_id: EntityId,
    pub attr: AttrKey,
    pub on_complete: Option<OnComplete>,
}

type TransitionKey = (EntityId, AttrKey);

/// Owns every in-flight transition, at most one per `(element, attribute)`.
#[derive(Clone, Debug, Default)]
pub struct TransitionScheduler {
    active: BTreeMap<TransitionKey, Transition>,
}

impl TransitionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn get(&self, id: &EntityId, attr: AttrKey) -> Option<&Transition> {
        self.active.get(&(id.clone(), attr))
    }

    pub fn has_pending(&self, id: &EntityId) -> bool {
        self.for_element(id).next().is_some()
    }

    pub fn for_element<'a>(&'a self, id: &'a EntityId) -> impl Iterator<Item = &'a Transition> {
        self.active
            .range((id.clone(), AttrKey::ALL[0])..)
            .take_while(move |((eid, _), _)| eid == id)
            .map(|(_, t)| t)
    }

    /// Active transitions in tick order.
    pub fn ordered(&self) -> Vec<&Transition> {
        let mut out: Vec<&Transition> = self.active.values().collect();
        out.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.element_id.cmp(&b.element_id))
                .then_with(|| a.attr.cmp(&b.attr))
        });
        out
    }

    /// Insert `t`, replacing any transition on the same `(element, attribute)`.
    ///
    /// When the replaced transition had already started, `t` starts from its interpolated
    /// value at `now` instead of the caller's `from`. Returns the replaced transition.
    pub fn schedule(&mut self, mut t: Transition, now: Millis) -> Option<Transition> {
        let key = (t.element_id.clone(), t.attr);
        if let Some(old) = self.active.get(&key)
            && old.has_started(now)
        {
            t.from = old.value_at(now);
        }
        self.active.insert(key, t)
    }

    /// Drop one transition, returning its interpolated value at `now`.
    pub fn cancel(&mut self, id: &EntityId, attr: AttrKey, now: Millis) -> Option<AttrValue> {
        self.active
            .remove(&(id.clone(), attr))
            .map(|t| t.value_at(now))
    }

    /// Drop every transition of `id`, returning each attribute's interpolated value at `now`.
    pub fn cancel_element(&mut self, id: &EntityId, now: Millis) -> Vec<(AttrKey, AttrValue)> {
        let keys: Vec<TransitionKey> = self
            .for_element(id)
            .map(|t| (t.element_id.clone(), t.attr))
            .collect();
        keys.into_iter()
            .filter_map(|key| {
                let t = self.active.remove(&key)?;
                Some((key.1, t.value_at(now)))
            })
            .collect()
    }

    /// Write interpolated values for `now` into `elements` and retire finished transitions.
    ///
    /// Transitions are applied in `(order, element, attribute)` order; ones still inside their
    /// delay leave the attribute untouched.
    pub fn tick(
        &mut self,
        now: Millis,
        elements: &mut BTreeMap<EntityId, VisualElement>,
    ) -> Vec<Completion> {
        let keys: Vec<TransitionKey> = self
            .ordered()
            .into_iter()
            .map(|t| (t.element_id.clone(), t.attr))
            .collect();

        let mut done = Vec::new();
        for key in keys {
            let Some(t) = self.active.get(&key) else {
                continue;
            };
            let Some(el) = elements.get_mut(&key.0) else {
                self.active.remove(&key);
                continue;
            };
            if !t.has_started(now) {
                continue;
            }

            el.current.set(key.1, t.value_at(now));
            if t.progress(now) >= 1.0 {
                let on_complete = t.on_complete;
                self.active.remove(&key);
                done.push(Completion {
                    element_id: key.0,
                    attr: key.1,
                    on_complete,
                });
            }
        }
        done
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/scheduler.rs"]
mod tests;
