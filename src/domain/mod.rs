pub mod board;
pub mod card;
pub mod ids;
pub mod list;
pub mod member;
pub mod ordering;
pub mod position;

pub use board::{Board, BoardSnapshot};
pub use card::Card;
pub use ids::{BoardId, CardId, ListId};
pub use list::List;
pub use member::{ItemKind, Member};
pub use ordering::{member_order, sort_members};
pub use position::Position;
