use crate::domain::{BoardId, CardId, ItemKind, ListId, Member, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A card on a kanban list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub board_id: BoardId,
    pub list_id: ListId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub position: Position,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Creates a new card at the given position
    pub fn new(board_id: BoardId, list_id: ListId, title: String, position: Position) -> Self {
        let now = Utc::now();
        Self {
            id: CardId::new(),
            board_id,
            list_id,
            title,
            description: None,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the title
    pub fn set_title(&mut self, title: String) {
        self.title = title;
        self.updated_at = Utc::now();
    }

    /// Sets the description
    pub fn set_description(&mut self, description: String) {
        self.description = Some(description);
        self.updated_at = Utc::now();
    }

    /// Moves the card to a position, optionally in another list
    pub(crate) fn place(&mut self, list_id: ListId, position: Position) {
        self.list_id = list_id;
        self.position = position;
        self.updated_at = Utc::now();
    }
}

impl Member for Card {
    type Id = CardId;
    type Parent = ListId;

    const KIND: ItemKind = ItemKind::Card;

    fn id(&self) -> CardId {
        self.id
    }

    fn parent(&self) -> ListId {
        self.list_id
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_creation() {
        let board = BoardId::new();
        let list = ListId::new();
        let card = Card::new(board, list, "Write docs".to_string(), Position::BASE);

        assert_eq!(card.title, "Write docs");
        assert_eq!(card.parent(), list);
        assert_eq!(card.board_id(), board);
        assert_eq!(card.position(), Position::BASE);
        assert_eq!(card.created_at, card.updated_at);
        assert!(card.description.is_none());
    }

    #[test]
    fn test_place_updates_timestamp() {
        let mut card = Card::new(
            BoardId::new(),
            ListId::new(),
            "Card".to_string(),
            Position::BASE,
        );
        let created = card.updated_at;
        let target = ListId::new();

        card.place(target, Position::from(4));

        assert_eq!(card.list_id, target);
        assert_eq!(card.position, Position::from(4));
        assert!(card.updated_at >= created);
    }

    #[test]
    fn test_description_is_omitted_when_empty() {
        let card = Card::new(
            BoardId::new(),
            ListId::new(),
            "Card".to_string(),
            Position::BASE,
        );
        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["position"], serde_json::json!(1.0));
    }
}
