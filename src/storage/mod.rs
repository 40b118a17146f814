use crate::{
    domain::{Board, BoardId, BoardSnapshot, Card, CardId, List, ListId},
    engine::{Change, Mutation, MutationPlan},
    error::{KanbanError, Result},
};
use async_trait::async_trait;

#[cfg(feature = "file-storage")]
pub mod file_storage;
pub mod memory_storage;

#[cfg(feature = "file-storage")]
pub use file_storage::FileStore;
pub use memory_storage::MemoryStore;

/// Applies committed board state.
///
/// Implementations must apply each [`Transaction`] all-or-nothing: after a
/// failed commit the board reads exactly as it did before.
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Persists a new, empty board
    async fn create_board(&self, board: &Board) -> Result<()>;

    /// Reads the current state of a board
    async fn load_snapshot(&self, board_id: &BoardId) -> Result<BoardSnapshot>;

    /// Applies every change of the transaction, or none of them
    async fn commit(&self, txn: &Transaction) -> Result<()>;
}

/// A single write inside a transaction
#[derive(Debug, Clone)]
pub enum BoardChange {
    InsertList(List),
    InsertCard(Card),
    UpdateList(Mutation<ListId, BoardId>),
    UpdateCard(Mutation<CardId, ListId>),
    /// New title of a list; its placement is left alone
    EditList(List),
    /// New title and description of a card; its placement is left alone
    EditCard(Card),
    RemoveCard(CardId),
    RemoveList(ListId),
}

/// Ordered writes scoped to one board
#[derive(Debug, Clone)]
pub struct Transaction {
    pub board_id: BoardId,
    pub changes: Vec<BoardChange>,
}

impl Transaction {
    pub fn new(board_id: BoardId) -> Self {
        Self {
            board_id,
            changes: Vec::new(),
        }
    }

    pub fn push(&mut self, change: BoardChange) {
        self.changes.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn card_updates(
        &mut self,
        mutations: impl IntoIterator<Item = Mutation<CardId, ListId>>,
    ) -> &mut Self {
        self.changes
            .extend(mutations.into_iter().map(BoardChange::UpdateCard));
        self
    }

    pub fn list_updates(
        &mut self,
        mutations: impl IntoIterator<Item = Mutation<ListId, BoardId>>,
    ) -> &mut Self {
        self.changes
            .extend(mutations.into_iter().map(BoardChange::UpdateList));
        self
    }
}

impl From<&MutationPlan<CardId, ListId>> for Transaction {
    fn from(plan: &MutationPlan<CardId, ListId>) -> Self {
        let mut txn = Self::new(plan.board_id);
        txn.card_updates(plan.mutations.iter().copied());
        txn
    }
}

impl From<&MutationPlan<ListId, BoardId>> for Transaction {
    fn from(plan: &MutationPlan<ListId, BoardId>) -> Self {
        let mut txn = Self::new(plan.board_id);
        txn.list_updates(plan.mutations.iter().copied());
        txn
    }
}

/// Applies a transaction to a snapshot in order.
///
/// Stops at the first invalid change and leaves `snapshot` partially
/// updated, so stores run it against a copy and keep the copy only on
/// success.
pub(crate) fn apply_transaction(snapshot: &mut BoardSnapshot, txn: &Transaction) -> Result<()> {
    let board_id = snapshot.id();
    if txn.board_id != board_id {
        return Err(KanbanError::StorageError(format!(
            "transaction for board {} applied to board {}",
            txn.board_id, board_id
        )));
    }

    for change in &txn.changes {
        match change {
            BoardChange::InsertList(list) => {
                if list.board_id != board_id {
                    return Err(KanbanError::InvalidTarget(format!(
                        "list {} belongs to board {}",
                        list.id, list.board_id
                    )));
                }
                if snapshot.list(list.id).is_some() {
                    return Err(KanbanError::StorageError(format!(
                        "list {} already exists",
                        list.id
                    )));
                }
                snapshot.lists.push(list.clone());
            }
            BoardChange::InsertCard(card) => {
                ensure_list_on_board(snapshot, card.list_id)?;
                if card.board_id != board_id {
                    return Err(KanbanError::InvalidTarget(format!(
                        "card {} belongs to board {}",
                        card.id, card.board_id
                    )));
                }
                if snapshot.card(card.id).is_some() {
                    return Err(KanbanError::StorageError(format!(
                        "card {} already exists",
                        card.id
                    )));
                }
                snapshot.cards.push(card.clone());
            }
            BoardChange::UpdateList(mutation) => {
                if let Some(parent) = mutation.change.parent() {
                    if parent != board_id {
                        return Err(KanbanError::InvalidTarget(format!(
                            "list {} cannot move to board {}",
                            mutation.item_id, parent
                        )));
                    }
                }
                let list = snapshot
                    .lists
                    .iter_mut()
                    .find(|list| list.id == mutation.item_id)
                    .ok_or_else(|| KanbanError::list_not_found(mutation.item_id))?;
                list.place(mutation.change.position());
            }
            BoardChange::UpdateCard(mutation) => {
                if let Change::Relocate { parent, .. } = mutation.change {
                    ensure_list_on_board(snapshot, parent)?;
                }
                let card = snapshot
                    .cards
                    .iter_mut()
                    .find(|card| card.id == mutation.item_id)
                    .ok_or_else(|| KanbanError::card_not_found(mutation.item_id))?;
                let list_id = mutation.change.parent().unwrap_or(card.list_id);
                card.place(list_id, mutation.change.position());
            }
            BoardChange::EditList(edited) => {
                let list = snapshot
                    .lists
                    .iter_mut()
                    .find(|list| list.id == edited.id)
                    .ok_or_else(|| KanbanError::list_not_found(edited.id))?;
                list.title = edited.title.clone();
                list.updated_at = edited.updated_at;
            }
            BoardChange::EditCard(edited) => {
                let card = snapshot
                    .cards
                    .iter_mut()
                    .find(|card| card.id == edited.id)
                    .ok_or_else(|| KanbanError::card_not_found(edited.id))?;
                card.title = edited.title.clone();
                card.description = edited.description.clone();
                card.updated_at = edited.updated_at;
            }
            BoardChange::RemoveCard(card_id) => {
                let index = snapshot
                    .cards
                    .iter()
                    .position(|card| card.id == *card_id)
                    .ok_or_else(|| KanbanError::card_not_found(card_id))?;
                snapshot.cards.remove(index);
            }
            BoardChange::RemoveList(list_id) => {
                let index = snapshot
                    .lists
                    .iter()
                    .position(|list| list.id == *list_id)
                    .ok_or_else(|| KanbanError::list_not_found(list_id))?;
                if snapshot.cards.iter().any(|card| card.list_id == *list_id) {
                    return Err(KanbanError::StorageError(format!(
                        "list {} still has cards",
                        list_id
                    )));
                }
                snapshot.lists.remove(index);
            }
        }
    }

    Ok(())
}

fn ensure_list_on_board(snapshot: &BoardSnapshot, list_id: ListId) -> Result<()> {
    if snapshot.list(list_id).is_none() {
        return Err(KanbanError::InvalidTarget(format!(
            "list {} is not on board {}",
            list_id,
            snapshot.id()
        )));
    }
    Ok(())
}
