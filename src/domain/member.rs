use crate::domain::{BoardId, Position};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fmt, hash::Hash};

/// Kind of item that occupies a position inside a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Card,
    List,
}

impl ItemKind {
    /// Name of the container this kind is ordered within
    pub fn parent_kind(&self) -> &'static str {
        match self {
            Self::Card => "list",
            Self::List => "board",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card => write!(f, "Card"),
            Self::List => write!(f, "List"),
        }
    }
}

/// An ordered member of a parent.
///
/// Cards are members of lists and lists are members of boards. The
/// allocator, normalizer and move engine only see this trait, so one
/// implementation serves both kinds.
pub trait Member {
    type Id: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + Serialize + DeserializeOwned;
    type Parent: Copy + Eq + Hash + fmt::Debug + fmt::Display + Serialize + DeserializeOwned;

    const KIND: ItemKind;

    fn id(&self) -> Self::Id;

    fn parent(&self) -> Self::Parent;

    /// Board the member lives on; moves never cross this boundary
    fn board_id(&self) -> BoardId;

    fn position(&self) -> Position;

    /// Secondary ordering key, only consulted when positions collide
    fn created_at(&self) -> DateTime<Utc>;
}
