use std::collections::BTreeMap;

use crate::foundation::core::EntityId;
use crate::layout::context::Attributes;

/// Sink for per-element drawing instructions.
///
/// The engine calls `update` for every mounted element on every tick, whether or not the
/// attributes changed, so implementations must be idempotent.
pub trait Renderer {
    fn create(&mut self, id: &EntityId, attrs: &Attributes);
    fn update(&mut self, id: &EntityId, attrs: &Attributes);
    fn destroy(&mut self, id: &EntityId);
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderCall {
    Create(EntityId, Attributes),
    Update(EntityId, Attributes),
    Destroy(EntityId),
}

/// Renderer that records every call and keeps the resulting live set.
#[derive(Clone, Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<RenderCall>,
    pub live: BTreeMap<EntityId, Attributes>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn creates(&self) -> impl Iterator<Item = &EntityId> {
        self.calls.iter().filter_map(|c| match c {
            RenderCall::Create(id, _) => Some(id),
            _ => None,
        })
    }

    pub fn destroys(&self) -> impl Iterator<Item = &EntityId> {
        self.calls.iter().filter_map(|c| match c {
            RenderCall::Destroy(id) => Some(id),
            _ => None,
        })
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl Renderer for RecordingRenderer {
    fn create(&mut self, id: &EntityId, attrs: &Attributes) {
        self.calls.push(RenderCall::Create(id.clone(), *attrs));
        self.live.insert(id.clone(), *attrs);
    }

    fn update(&mut self, id: &EntityId, attrs: &Attributes) {
        self.calls.push(RenderCall::Update(id.clone(), *attrs));
        self.live.insert(id.clone(), *attrs);
    }

    fn destroy(&mut self, id: &EntityId) {
        self.calls.push(RenderCall::Destroy(id.clone()));
        self.live.remove(id);
    }
}
