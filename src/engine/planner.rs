use crate::{
    config::OrderingConfig,
    domain::{
        ordering::{has_collisions, member_order, sort_member_refs},
        BoardId, Member, Position,
    },
    engine::{
        allocator::{Allocation, PositionAllocator},
        normalizer::{Normalization, SequenceNormalizer},
        plan::{Change, Mutation, MutationPlan},
    },
    error::{KanbanError, Result},
};
use std::cmp::Ordering;
use tracing::{debug, error, warn};

/// The parent an item is being placed into, as read from a snapshot
#[derive(Debug, Clone)]
pub struct Destination<'a, M: Member> {
    pub parent: M::Parent,
    /// Board the parent belongs to
    pub board_id: BoardId,
    /// Current members of the parent, in any order. The moving item may be
    /// included; the engine leaves it out when computing neighbours.
    pub members: Vec<&'a M>,
}

impl<'a, M: Member> Destination<'a, M> {
    pub fn new(parent: M::Parent, board_id: BoardId, members: Vec<&'a M>) -> Self {
        Self {
            parent,
            board_id,
            members,
        }
    }
}

/// Where a new or moved item lands, plus any sibling renumbering needed to
/// make room for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement<I, P> {
    pub position: Position,
    pub mutations: Vec<Mutation<I, P>>,
}

/// Plans moves of cards within and across lists, and of lists within a
/// board.
///
/// Planning is pure: it reads the snapshot it is given and returns the
/// mutations to apply, so it can run under the caller's lock without
/// suspension points.
#[derive(Debug, Clone)]
pub struct MoveEngine {
    allocator: PositionAllocator,
    normalizer: SequenceNormalizer,
    clamp_target_index: bool,
}

impl MoveEngine {
    pub fn new(config: &OrderingConfig) -> Self {
        let base = config.base();
        Self {
            allocator: PositionAllocator::new(base),
            normalizer: SequenceNormalizer::new(base),
            clamp_target_index: config.clamp_target_index,
        }
    }

    /// Computes the mutations that put `item` at `target_index` of the
    /// destination parent.
    ///
    /// Moving to the index the item already occupies yields an empty plan.
    /// A cross-parent move touches only the item; the source parent keeps
    /// its gap.
    pub fn plan_move<M: Member>(
        &self,
        item: &M,
        destination: &Destination<'_, M>,
        target_index: usize,
    ) -> Result<MutationPlan<M::Id, M::Parent>> {
        if destination.board_id != item.board_id() {
            return Err(KanbanError::InvalidTarget(format!(
                "{} {} is on board {} but {} {} is on board {}",
                M::KIND,
                item.id(),
                item.board_id(),
                M::KIND.parent_kind(),
                destination.parent,
                destination.board_id
            )));
        }

        let mut siblings: Vec<&M> = destination
            .members
            .iter()
            .copied()
            .filter(|member| member.id() != item.id())
            .collect();
        sort_member_refs(&mut siblings);

        let index = self.resolve_index::<M>(target_index, siblings.len())?;
        let same_parent = item.parent() == destination.parent;

        if same_parent {
            let current = siblings
                .iter()
                .take_while(|sibling| member_order(**sibling, item) == Ordering::Less)
                .count();
            if current == index {
                debug!(kind = %M::KIND, item = %item.id(), index, "move targets current index, nothing to do");
                return Ok(MutationPlan::empty(item.board_id(), item.id()));
            }
        }

        let placement = self.place(destination.parent, &siblings, index)?;
        let change = if same_parent {
            Change::Reposition {
                position: placement.position,
            }
        } else {
            Change::Relocate {
                parent: destination.parent,
                position: placement.position,
            }
        };

        let mut mutations = placement.mutations;
        mutations.push(Mutation {
            item_id: item.id(),
            change,
        });

        debug!(
            kind = %M::KIND,
            item = %item.id(),
            parent = %destination.parent,
            index,
            position = %placement.position,
            mutations = mutations.len(),
            "planned move"
        );

        Ok(MutationPlan {
            board_id: item.board_id(),
            item_id: item.id(),
            mutations,
        })
    }

    /// Position for a new member appended to the end of the destination
    pub fn plan_append<M: Member>(
        &self,
        destination: &Destination<'_, M>,
    ) -> Result<Placement<M::Id, M::Parent>> {
        let mut siblings = destination.members.clone();
        sort_member_refs(&mut siblings);
        let tail = siblings.len();
        self.place(destination.parent, &siblings, tail)
    }

    /// Renumbers the members of one parent
    pub fn normalize<M: Member>(
        &self,
        parent: M::Parent,
        members: &[&M],
    ) -> Normalization<M::Id, M::Parent> {
        self.normalizer.normalize(parent, members)
    }

    fn resolve_index<M: Member>(&self, requested: usize, len: usize) -> Result<usize> {
        if requested <= len {
            Ok(requested)
        } else if self.clamp_target_index {
            Ok(len)
        } else {
            Err(KanbanError::InvalidTarget(format!(
                "index {} is out of range for a {} with {} {}s",
                requested,
                M::KIND.parent_kind(),
                len,
                M::KIND.to_string().to_lowercase()
            )))
        }
    }

    /// `siblings` must be sorted and exclude the item being placed
    fn place<M: Member>(
        &self,
        parent: M::Parent,
        siblings: &[&M],
        index: usize,
    ) -> Result<Placement<M::Id, M::Parent>> {
        if has_collisions(siblings) {
            warn!(kind = %M::KIND, parent = %parent, "sibling positions collide, renumbering");
            return self.place_normalized(parent, siblings, index);
        }

        let positions: Vec<Position> = siblings.iter().map(|s| s.position()).collect();
        match self.allocator.allocate(&positions, index) {
            Allocation::Assigned(position) => Ok(Placement {
                position,
                mutations: Vec::new(),
            }),
            Allocation::Exhausted => {
                debug!(kind = %M::KIND, parent = %parent, index, "no room at index, renumbering");
                self.place_normalized(parent, siblings, index)
            }
        }
    }

    fn place_normalized<M: Member>(
        &self,
        parent: M::Parent,
        siblings: &[&M],
        index: usize,
    ) -> Result<Placement<M::Id, M::Parent>> {
        let normalization = self.normalizer.normalize(parent, siblings);

        match self.allocator.allocate(&normalization.positions(), index) {
            Allocation::Assigned(position) => Ok(Placement {
                position,
                mutations: normalization.mutations,
            }),
            Allocation::Exhausted => {
                error!(kind = %M::KIND, parent = %parent, index, "allocation failed after renumbering");
                Err(KanbanError::AllocationExhausted {
                    parent: format!("{} {}", M::KIND.parent_kind(), parent),
                })
            }
        }
    }
}

impl Default for MoveEngine {
    fn default() -> Self {
        Self::new(&OrderingConfig::default())
    }
}
