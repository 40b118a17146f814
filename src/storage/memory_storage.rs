use crate::{
    domain::{Board, BoardId, BoardSnapshot},
    error::{KanbanError, Result},
    storage::{apply_transaction, BoardStore, Transaction},
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory board store.
///
/// Commits run against a copy of the board which replaces the stored one
/// only when every change applied.
#[derive(Debug, Default)]
pub struct MemoryStore {
    boards: RwLock<HashMap<BoardId, BoardSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn create_board(&self, board: &Board) -> Result<()> {
        let mut boards = self.boards.write().await;
        if boards.contains_key(&board.id) {
            return Err(KanbanError::StorageError(format!(
                "board {} already exists",
                board.id
            )));
        }
        boards.insert(board.id, BoardSnapshot::new(board.clone()));
        Ok(())
    }

    async fn load_snapshot(&self, board_id: &BoardId) -> Result<BoardSnapshot> {
        self.boards
            .read()
            .await
            .get(board_id)
            .cloned()
            .ok_or_else(|| KanbanError::BoardNotFound(board_id.to_string()))
    }

    async fn commit(&self, txn: &Transaction) -> Result<()> {
        let mut boards = self.boards.write().await;
        let current = boards
            .get(&txn.board_id)
            .ok_or_else(|| KanbanError::BoardNotFound(txn.board_id.to_string()))?;

        let mut next = current.clone();
        apply_transaction(&mut next, txn)?;
        boards.insert(txn.board_id, next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Card, List, Position},
        engine::Mutation,
        storage::BoardChange,
    };

    #[tokio::test]
    async fn test_create_and_load_board() {
        let store = MemoryStore::new();
        let board = Board::new("Sprint".to_string());

        store.create_board(&board).await.unwrap();

        let snapshot = store.load_snapshot(&board.id).await.unwrap();
        assert_eq!(snapshot.board.title, "Sprint");
        assert!(store.create_board(&board).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_board() {
        let store = MemoryStore::new();
        let err = store.load_snapshot(&BoardId::new()).await.unwrap_err();
        assert!(matches!(err, KanbanError::BoardNotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_board_untouched() {
        let store = MemoryStore::new();
        let board = Board::new("Sprint".to_string());
        store.create_board(&board).await.unwrap();

        let list = List::new(board.id, "Todo".to_string(), Position::BASE);
        let card = Card::new(board.id, list.id, "Card".to_string(), Position::BASE);

        let mut txn = Transaction::new(board.id);
        txn.push(BoardChange::InsertList(list.clone()));
        txn.push(BoardChange::InsertCard(card.clone()));
        // unknown card: the whole transaction must roll back
        txn.card_updates([Mutation::reposition(
            crate::domain::CardId::new(),
            Position::from(2),
        )]);

        assert!(store.commit(&txn).await.is_err());

        let snapshot = store.load_snapshot(&board.id).await.unwrap();
        assert!(snapshot.lists.is_empty());
        assert!(snapshot.cards.is_empty());
    }
}
