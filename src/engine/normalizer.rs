use crate::domain::{ordering::sort_member_refs, Member, Position};
use crate::engine::plan::Mutation;

/// Outcome of renumbering one parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalization<I, P> {
    pub parent: P,
    /// Every member in display order with its position after normalization
    pub order: Vec<(I, Position)>,
    /// Only the members whose position actually changed
    pub mutations: Vec<Mutation<I, P>>,
}

impl<I: Copy, P> Normalization<I, P> {
    pub fn is_noop(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.order.iter().map(|(_, position)| *position).collect()
    }
}

/// Rewrites the positions of a parent's members to `base, base + 1, ...`
/// without changing their relative order.
#[derive(Debug, Clone, Copy)]
pub struct SequenceNormalizer {
    base: Position,
}

impl SequenceNormalizer {
    pub fn new(base: Position) -> Self {
        Self { base }
    }

    pub fn normalize<M: Member>(
        &self,
        parent: M::Parent,
        members: &[&M],
    ) -> Normalization<M::Id, M::Parent> {
        debug_assert!(members.iter().all(|m| m.parent() == parent));

        let mut sorted = members.to_vec();
        sort_member_refs(&mut sorted);

        let mut order = Vec::with_capacity(sorted.len());
        let mut mutations = Vec::new();

        for (index, member) in sorted.iter().enumerate() {
            let target = Position::nth(self.base, index);
            if member.position() != target {
                mutations.push(Mutation::reposition(member.id(), target));
            }
            order.push((member.id(), target));
        }

        Normalization {
            parent,
            order,
            mutations,
        }
    }
}

impl Default for SequenceNormalizer {
    fn default() -> Self {
        Self::new(Position::BASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoardId, Card, ListId};
    use chrono::Duration;

    fn cards(list: ListId, positions: &[f64]) -> Vec<Card> {
        let board = BoardId::new();
        positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Card::new(
                    board,
                    list,
                    format!("card {}", i),
                    Position::new(*p).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_dense_sequence_is_noop() {
        let list = ListId::new();
        let cards = cards(list, &[1.0, 2.0, 3.0]);
        let refs: Vec<&Card> = cards.iter().collect();

        let result = SequenceNormalizer::default().normalize(list, &refs);

        assert!(result.is_noop());
        assert_eq!(result.order.len(), 3);
    }

    #[test]
    fn test_closes_gaps_and_keeps_order() {
        let list = ListId::new();
        let cards = cards(list, &[10.0, -3.0, 2.5, 3.0]);
        let refs: Vec<&Card> = cards.iter().collect();

        let result = SequenceNormalizer::default().normalize(list, &refs);

        let ids: Vec<_> = result.order.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![cards[1].id, cards[2].id, cards[3].id, cards[0].id]);
        assert_eq!(
            result.positions(),
            vec![
                Position::from(1),
                Position::from(2),
                Position::from(3),
                Position::from(4)
            ]
        );
        // card at 3.0 already sits at its normalized slot
        assert_eq!(result.mutations.len(), 3);
        assert!(result.mutations.iter().all(|m| m.item_id != cards[3].id));
    }

    #[test]
    fn test_second_pass_is_noop() {
        let list = ListId::new();
        let mut cards = cards(list, &[0.5, 7.0, 9.25]);
        let refs: Vec<&Card> = cards.iter().collect();
        let first = SequenceNormalizer::default().normalize(list, &refs);

        for (id, position) in &first.order {
            if let Some(card) = cards.iter_mut().find(|c| c.id == *id) {
                card.position = *position;
            }
        }

        let refs: Vec<&Card> = cards.iter().collect();
        assert!(SequenceNormalizer::default().normalize(list, &refs).is_noop());
    }

    #[test]
    fn test_collisions_resolved_by_creation_order() {
        let list = ListId::new();
        let mut cards = cards(list, &[2.0, 2.0]);
        cards[1].created_at = cards[0].created_at - Duration::seconds(1);
        let refs: Vec<&Card> = cards.iter().collect();

        let result = SequenceNormalizer::default().normalize(list, &refs);

        assert_eq!(result.order[0], (cards[1].id, Position::from(1)));
        assert_eq!(result.order[1], (cards[0].id, Position::from(2)));
    }

    #[test]
    fn test_empty_parent() {
        let list = ListId::new();
        let result = SequenceNormalizer::default().normalize::<Card>(list, &[]);
        assert!(result.is_noop());
        assert!(result.order.is_empty());
    }
}
