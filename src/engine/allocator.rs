use crate::domain::Position;

/// Result of asking for a free position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    Assigned(Position),
    /// No representable value fits at the requested index; the parent has to
    /// be normalized before allocating again
    Exhausted,
}

/// Picks a position for an item inserted at an index of a sorted sequence.
///
/// Head inserts go one below the first member, tail inserts one above the
/// last, and anything in between takes the midpoint of its neighbours. The
/// result always sorts strictly between the neighbours at `index`.
#[derive(Debug, Clone, Copy)]
pub struct PositionAllocator {
    base: Position,
}

impl PositionAllocator {
    pub fn new(base: Position) -> Self {
        Self { base }
    }

    pub fn base(&self) -> Position {
        self.base
    }

    /// `existing` must be ascending and exclude the item being placed. An
    /// index past the end is treated as an append.
    pub fn allocate(&self, existing: &[Position], index: usize) -> Allocation {
        debug_assert!(existing.windows(2).all(|pair| pair[0] <= pair[1]));

        let index = index.min(existing.len());
        let before = index.checked_sub(1).map(|i| existing[i]);
        let after = existing.get(index).copied();

        let slot = match (before, after) {
            (None, None) => Some(self.base),
            (None, Some(first)) => first.before(),
            (Some(last), None) => last.after(),
            (Some(low), Some(high)) => Position::between(low, high),
        };

        slot.map_or(Allocation::Exhausted, Allocation::Assigned)
    }
}

impl Default for PositionAllocator {
    fn default() -> Self {
        Self::new(Position::BASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(values: &[f64]) -> Vec<Position> {
        values.iter().map(|v| Position::new(*v).unwrap()).collect()
    }

    fn assigned(allocation: Allocation) -> f64 {
        match allocation {
            Allocation::Assigned(position) => position.value(),
            Allocation::Exhausted => panic!("expected a position"),
        }
    }

    #[test]
    fn test_empty_parent_gets_base() {
        let allocator = PositionAllocator::default();
        assert_eq!(assigned(allocator.allocate(&[], 0)), 1.0);
        assert_eq!(assigned(allocator.allocate(&[], 7)), 1.0);
    }

    #[test]
    fn test_head_and_tail() {
        let allocator = PositionAllocator::default();
        let existing = positions(&[1.0, 2.0, 3.0]);

        assert_eq!(assigned(allocator.allocate(&existing, 0)), 0.0);
        assert_eq!(assigned(allocator.allocate(&existing, 3)), 4.0);
    }

    #[test]
    fn test_single_item() {
        let allocator = PositionAllocator::default();
        let existing = positions(&[5.0]);

        assert_eq!(assigned(allocator.allocate(&existing, 0)), 4.0);
        assert_eq!(assigned(allocator.allocate(&existing, 1)), 6.0);
    }

    #[test]
    fn test_between_neighbours() {
        let allocator = PositionAllocator::default();
        let existing = positions(&[1.0, 2.0, 3.0]);

        let p = assigned(allocator.allocate(&existing, 1));
        assert!(1.0 < p && p < 2.0);

        let p = assigned(allocator.allocate(&existing, 2));
        assert!(2.0 < p && p < 3.0);
    }

    #[test]
    fn test_gap_exhaustion_is_signalled() {
        let allocator = PositionAllocator::default();
        let next = f64::from_bits(1.0f64.to_bits() + 1);
        let existing = positions(&[1.0, next]);

        assert_eq!(allocator.allocate(&existing, 1), Allocation::Exhausted);
        // the ends are still free
        assert_eq!(assigned(allocator.allocate(&existing, 0)), 0.0);
    }

    #[test]
    fn test_repeated_head_inserts_stay_ordered() {
        let allocator = PositionAllocator::default();
        let mut existing = positions(&[1.0, 2.0]);

        for _ in 0..50 {
            let p = match allocator.allocate(&existing, 1) {
                Allocation::Assigned(p) => p,
                Allocation::Exhausted => break,
            };
            assert!(existing[0] < p && p < existing[1]);
            existing.insert(1, p);
        }
    }

    #[test]
    fn test_custom_base() {
        let allocator = PositionAllocator::new(Position::from(100));
        assert_eq!(assigned(allocator.allocate(&[], 0)), 100.0);
        assert_eq!(allocator.base(), Position::from(100));
    }
}
