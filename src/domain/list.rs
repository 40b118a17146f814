use crate::domain::{BoardId, ItemKind, ListId, Member, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A column on a board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub board_id: BoardId,
    pub title: String,
    pub position: Position,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl List {
    pub fn new(board_id: BoardId, title: String, position: Position) -> Self {
        let now = Utc::now();
        Self {
            id: ListId::new(),
            board_id,
            title,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
        self.updated_at = Utc::now();
    }

    pub(crate) fn place(&mut self, position: Position) {
        self.position = position;
        self.updated_at = Utc::now();
    }
}

impl Member for List {
    type Id = ListId;
    type Parent = BoardId;

    const KIND: ItemKind = ItemKind::List;

    fn id(&self) -> ListId {
        self.id
    }

    fn parent(&self) -> BoardId {
        self.board_id
    }

    fn board_id(&self) -> BoardId {
        self.board_id
    }

    fn position(&self) -> Position {
        self.position
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
