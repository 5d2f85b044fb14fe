//! Events raised by a session tick for the host loop.

use serde::Serialize;

use crate::pool::EntityKind;
use crate::states::StateId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Character entered a new locomotion state.
    StateChanged {
        from: Option<StateId>,
        to: StateId,
    },
    /// A bonus was collected; `score` is the total after it.
    BonusCollected { slot: usize, score: u32 },
    /// An obstacle was hit. Terminal: the session stops ticking.
    GameOver {
        slot: usize,
        kind: EntityKind,
        score: u32,
        high_score: u32,
    },
}

impl GameEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::GameOver { .. })
    }
}
