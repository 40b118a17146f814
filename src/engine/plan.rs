use crate::domain::{BoardId, CardId, ListId, Position};
use serde::{Deserialize, Serialize};

/// A field update for one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change<P> {
    /// New position inside the current parent
    Reposition { position: Position },
    /// New parent and position, applied together
    Relocate { parent: P, position: Position },
}

impl<P: Copy> Change<P> {
    pub fn position(&self) -> Position {
        match self {
            Self::Reposition { position } | Self::Relocate { position, .. } => *position,
        }
    }

    /// The new parent, when the change moves the item
    pub fn parent(&self) -> Option<P> {
        match self {
            Self::Reposition { .. } => None,
            Self::Relocate { parent, .. } => Some(*parent),
        }
    }
}

/// One atomic update, independent of how the store lays out its records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation<I, P> {
    pub item_id: I,
    pub change: Change<P>,
}

impl<I, P> Mutation<I, P> {
    pub fn reposition(item_id: I, position: Position) -> Self {
        Self {
            item_id,
            change: Change::Reposition { position },
        }
    }

    pub fn relocate(item_id: I, parent: P, position: Position) -> Self {
        Self {
            item_id,
            change: Change::Relocate { parent, position },
        }
    }
}

/// Ordered updates realizing one operation on one board.
///
/// The plan must be applied all-or-nothing. When the engine had to
/// renumber siblings first, their mutations precede the moving item's,
/// which is always last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationPlan<I, P> {
    pub board_id: BoardId,
    pub item_id: I,
    pub mutations: Vec<Mutation<I, P>>,
}

pub type CardPlan = MutationPlan<CardId, ListId>;
pub type ListPlan = MutationPlan<ListId, BoardId>;

impl<I: Copy + PartialEq, P: Copy> MutationPlan<I, P> {
    /// A plan that changes nothing
    pub fn empty(board_id: BoardId, item_id: I) -> Self {
        Self {
            board_id,
            item_id,
            mutations: Vec::new(),
        }
    }

    /// True when the item is already in place and nothing is written
    pub fn is_noop(&self) -> bool {
        self.mutations.is_empty()
    }

    /// The update for the moving item itself
    pub fn item_change(&self) -> Option<&Change<P>> {
        self.mutations
            .iter()
            .rev()
            .find(|m| m.item_id == self.item_id)
            .map(|m| &m.change)
    }

    /// Updates to other members made to repair or renumber the parent
    pub fn sibling_mutations(&self) -> impl Iterator<Item = &Mutation<I, P>> {
        self.mutations.iter().filter(move |m| m.item_id != self.item_id)
    }
}
