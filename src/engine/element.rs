use crate::foundation::core::EntityId;
use crate::layout::context::Attributes;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum AnimationState {
    Entering,
    Active,
    Exiting,
}

/// Keyed visual for one entity.
///
/// `current` is what the renderer sees this tick; `target` is where the running transitions
/// are heading. Running transitions themselves live in the scheduler.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct VisualElement {
    pub id: EntityId,
    pub current: Attributes,
    pub target: Attributes,
    pub state: AnimationState,
    /// Rank in the most recent frame that contained this entity.
    pub rank: usize,
    pub(crate) mounted: bool,
}

impl VisualElement {
    pub(crate) fn entering(id: EntityId, from: Attributes, target: Attributes, rank: usize) -> Self {
        Self {
            id,
            current: from,
            target,
            state: AnimationState::Entering,
            rank,
            mounted: false,
        }
    }

    /// Whether the renderer has been told to `create` this element.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_exiting(&self) -> bool {
        self.state == AnimationState::Exiting
    }
}
