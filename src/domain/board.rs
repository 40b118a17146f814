use crate::domain::{ordering::sort_member_refs, BoardId, Card, CardId, List, ListId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A kanban board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Board {
    pub fn new(title: String) -> Self {
        Self {
            id: BoardId::new(),
            title,
            created_at: Utc::now(),
        }
    }
}

/// Point-in-time state of a board: its lists and every card on them.
///
/// Snapshots are what the move engine plans against. They are read fresh
/// under the board lock for each request and never cached across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub board: Board,
    #[serde(default)]
    pub lists: Vec<List>,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl BoardSnapshot {
    /// Creates an empty snapshot for a new board
    pub fn new(board: Board) -> Self {
        Self {
            board,
            lists: Vec::new(),
            cards: Vec::new(),
        }
    }

    pub fn id(&self) -> BoardId {
        self.board.id
    }

    pub fn list(&self, id: ListId) -> Option<&List> {
        self.lists.iter().find(|list| list.id == id)
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// Lists of the board in display order
    pub fn ordered_lists(&self) -> Vec<&List> {
        let mut lists: Vec<&List> = self.lists.iter().collect();
        sort_member_refs(&mut lists);
        lists
    }

    /// Cards of one list in display order
    pub fn ordered_cards(&self, list_id: ListId) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self
            .cards
            .iter()
            .filter(|card| card.list_id == list_id)
            .collect();
        sort_member_refs(&mut cards);
        cards
    }
}
