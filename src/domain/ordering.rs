use crate::domain::Member;
use std::cmp::Ordering;

/// Total order over the members of one parent.
///
/// Position decides. Creation time and then id only matter when two members
/// share a position, which means the parent needs repair; they make the
/// recovered order deterministic.
///
/// # Examples
/// ```
/// use kanban_core::domain::{ordering::sort_members, BoardId, Card, ListId, Position};
///
/// let (board, list) = (BoardId::new(), ListId::new());
/// let mut cards = vec![
///     Card::new(board, list, "C".to_string(), Position::from(3)),
///     Card::new(board, list, "A".to_string(), Position::from(1)),
///     Card::new(board, list, "B".to_string(), Position::from(2)),
/// ];
///
/// sort_members(&mut cards);
/// assert_eq!(cards[0].title, "A");
/// ```
pub fn member_order<M: Member>(a: &M, b: &M) -> Ordering {
    a.position()
        .cmp(&b.position())
        .then_with(|| a.created_at().cmp(&b.created_at()))
        .then_with(|| a.id().cmp(&b.id()))
}

/// Sorts members in place into user-visible order
pub fn sort_members<M: Member>(members: &mut [M]) {
    members.sort_by(member_order);
}

/// Sorts borrowed members into user-visible order
pub fn sort_member_refs<M: Member>(members: &mut [&M]) {
    members.sort_by(|a, b| member_order(*a, *b));
}

/// Returns true when two members of an already sorted slice share a position
pub fn has_collisions<M: Member>(sorted: &[&M]) -> bool {
    sorted
        .windows(2)
        .any(|pair| pair[0].position() == pair[1].position())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoardId, Card, ListId, Position};
    use chrono::Duration;

    fn card(title: &str, position: u32) -> Card {
        Card::new(
            BoardId::new(),
            ListId::new(),
            title.to_string(),
            Position::from(position),
        )
    }

    #[test]
    fn test_sort_by_position() {
        let mut cards = vec![card("C", 3), card("A", 1), card("B", 2)];

        sort_members(&mut cards);

        assert_eq!(cards[0].title, "A");
        assert_eq!(cards[1].title, "B");
        assert_eq!(cards[2].title, "C");
    }

    #[test]
    fn test_fractional_positions_sort_between_integers() {
        let mut cards = vec![card("B", 2), card("A", 1)];
        let mut mid = card("mid", 0);
        mid.position = Position::new(1.5).unwrap();
        cards.push(mid);

        sort_members(&mut cards);

        assert_eq!(cards[1].title, "mid");
    }

    #[test]
    fn test_collision_falls_back_to_creation_time() {
        let mut older = card("older", 2);
        let newer = card("newer", 2);
        older.created_at = newer.created_at - Duration::seconds(5);

        assert_eq!(member_order(&older, &newer), Ordering::Less);
        assert_eq!(member_order(&newer, &older), Ordering::Greater);
    }

    #[test]
    fn test_has_collisions() {
        let a = card("A", 1);
        let b = card("B", 2);
        let c = card("C", 2);

        assert!(!has_collisions(&[&a, &b]));
        assert!(has_collisions(&[&a, &b, &c]));
        assert!(!has_collisions::<Card>(&[]));
    }
}
