//! Request handling around the move engine.
//!
//! Every operation that changes positions runs the same cycle under the
//! board's lock: read a fresh snapshot, plan, commit. Events are published
//! after the lock is released and only for committed changes.

pub mod locks;

pub use locks::{BoardGuard, BoardLocks};

use crate::{
    broadcast::{BoardEvent, BroadcastGate, MovePayload, Renumbered},
    config::ServiceConfig,
    domain::{Board, BoardId, BoardSnapshot, Card, CardId, List, ListId, Member},
    engine::{Destination, MoveEngine, Mutation, MutationPlan},
    error::{KanbanError, Result},
    storage::{BoardChange, BoardStore, Transaction},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A drag-and-drop request: put `item_id` at `to_index` of `to_parent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest<I, P> {
    pub item_id: I,
    /// Where the client last saw the item; the snapshot has the final say
    pub from_parent: P,
    pub to_parent: P,
    pub to_index: usize,
}

pub type MoveCard = MoveRequest<CardId, ListId>;
pub type MoveList = MoveRequest<ListId, BoardId>;

/// A committed move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome<I, P> {
    pub payload: MovePayload<I, P>,
    /// The plan that was committed; empty when the item was already in place
    pub plan: MutationPlan<I, P>,
}

/// Orders cards and lists on behalf of the request layer
pub struct BoardService<S, G> {
    store: S,
    gate: G,
    engine: MoveEngine,
    locks: BoardLocks,
    config: ServiceConfig,
}

impl<S: BoardStore, G: BroadcastGate> BoardService<S, G> {
    pub fn new(store: S, gate: G, config: ServiceConfig) -> Self {
        Self {
            engine: MoveEngine::new(&config.ordering),
            locks: BoardLocks::new(config.lock_timeout()),
            store,
            gate,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Current state of a board
    pub async fn snapshot(&self, board_id: BoardId) -> Result<BoardSnapshot> {
        self.store.load_snapshot(&board_id).await
    }

    pub async fn create_board(&self, title: String) -> Result<Board> {
        let board = Board::new(title);
        self.store.create_board(&board).await?;
        info!(board = %board.id, "created board");
        Ok(board)
    }

    /// Appends a list to the end of a board
    pub async fn create_list(&self, board_id: BoardId, title: String) -> Result<List> {
        let (list, renumbered) = {
            let _guard = self.locks.acquire(board_id).await?;
            let snapshot = self.store.load_snapshot(&board_id).await?;

            let destination = Destination::new(board_id, board_id, snapshot.lists.iter().collect());
            let placement = self.engine.plan_append(&destination)?;
            let list = List::new(board_id, title, placement.position);

            let mut txn = Transaction::new(board_id);
            txn.list_updates(placement.mutations.iter().copied());
            txn.push(BoardChange::InsertList(list.clone()));
            self.store.commit(&txn).await?;

            (list, placement.mutations)
        };

        info!(board = %board_id, list = %list.id, position = %list.position, "created list");
        self.publish_lists_renumbered(board_id, &renumbered);
        self.gate.publish(board_id, BoardEvent::ListCreated(list.clone()));
        Ok(list)
    }

    /// Appends a card to the end of a list
    pub async fn create_card(
        &self,
        board_id: BoardId,
        list_id: ListId,
        title: String,
    ) -> Result<Card> {
        let (card, renumbered) = {
            let _guard = self.locks.acquire(board_id).await?;
            let snapshot = self.store.load_snapshot(&board_id).await?;
            let list = Self::list_on_board(&snapshot, list_id)?;

            let destination = Destination::new(list.id, board_id, snapshot.ordered_cards(list.id));
            let placement = self.engine.plan_append(&destination)?;
            let card = Card::new(board_id, list.id, title, placement.position);

            let mut txn = Transaction::new(board_id);
            txn.card_updates(placement.mutations.iter().copied());
            txn.push(BoardChange::InsertCard(card.clone()));
            self.store.commit(&txn).await?;

            (card, placement.mutations)
        };

        info!(
            board = %board_id,
            list = %list_id,
            card = %card.id,
            position = %card.position,
            "created card"
        );
        self.publish_cards_renumbered(board_id, list_id, &renumbered);
        self.gate.publish(board_id, BoardEvent::CardCreated(card.clone()));
        Ok(card)
    }

    /// Moves a card within its list or to another list of the same board
    pub async fn move_card(
        &self,
        board_id: BoardId,
        request: MoveCard,
    ) -> Result<MoveOutcome<CardId, ListId>> {
        let outcome = {
            let _guard = self.locks.acquire(board_id).await?;
            let snapshot = self.store.load_snapshot(&board_id).await?;

            let card = snapshot
                .card(request.item_id)
                .ok_or_else(|| KanbanError::card_not_found(request.item_id))?;
            if card.list_id != request.from_parent {
                debug!(
                    card = %card.id,
                    requested = %request.from_parent,
                    actual = %card.list_id,
                    "client saw the card in another list, using snapshot"
                );
            }
            let target = Self::list_on_board(&snapshot, request.to_parent)?;

            let destination =
                Destination::new(target.id, board_id, snapshot.ordered_cards(target.id));
            let plan = self
                .engine
                .plan_move(card, &destination, request.to_index)?;

            let txn = Transaction::from(&plan);
            self.commit_plan(card, target.id, plan, txn).await?
        };

        if !outcome.plan.is_noop() {
            let siblings: Vec<_> = outcome.plan.sibling_mutations().copied().collect();
            self.publish_cards_renumbered(board_id, outcome.payload.new_parent_id, &siblings);
            self.gate.publish(board_id, BoardEvent::CardMoved(outcome.payload));
        }
        Ok(outcome)
    }

    /// Reorders a list within its board
    pub async fn move_list(
        &self,
        board_id: BoardId,
        request: MoveList,
    ) -> Result<MoveOutcome<ListId, BoardId>> {
        let outcome = {
            let _guard = self.locks.acquire(board_id).await?;
            let snapshot = self.store.load_snapshot(&board_id).await?;

            let list = Self::list_on_board(&snapshot, request.item_id)
                .map_err(|_| KanbanError::list_not_found(request.item_id))?;
            let members = if request.to_parent == board_id {
                snapshot.ordered_lists()
            } else {
                Vec::new()
            };

            let destination = Destination::new(request.to_parent, request.to_parent, members);
            let plan = self
                .engine
                .plan_move(list, &destination, request.to_index)?;

            let txn = Transaction::from(&plan);
            self.commit_plan(list, board_id, plan, txn).await?
        };

        if !outcome.plan.is_noop() {
            let siblings: Vec<_> = outcome.plan.sibling_mutations().copied().collect();
            self.publish_lists_renumbered(board_id, &siblings);
            self.gate.publish(board_id, BoardEvent::ListMoved(outcome.payload));
        }
        Ok(outcome)
    }

    /// Removes a card and closes the gap it leaves in its list
    pub async fn delete_card(&self, board_id: BoardId, card_id: CardId) -> Result<()> {
        let (list_id, renumbered) = {
            let _guard = self.locks.acquire(board_id).await?;
            let snapshot = self.store.load_snapshot(&board_id).await?;

            let card = snapshot
                .card(card_id)
                .ok_or_else(|| KanbanError::card_not_found(card_id))?;
            let list_id = card.list_id;

            let mut txn = Transaction::new(board_id);
            txn.push(BoardChange::RemoveCard(card_id));

            let mut renumbered = Vec::new();
            if self.config.normalize_on_delete {
                let remaining: Vec<&Card> = snapshot
                    .ordered_cards(list_id)
                    .into_iter()
                    .filter(|c| c.id != card_id)
                    .collect();
                renumbered = self.engine.normalize(list_id, &remaining).mutations;
                txn.card_updates(renumbered.iter().copied());
            }

            self.store.commit(&txn).await?;
            (list_id, renumbered)
        };

        info!(board = %board_id, card = %card_id, renumbered = renumbered.len(), "deleted card");
        self.gate.publish(board_id, BoardEvent::CardDeleted { card_id, list_id });
        self.publish_cards_renumbered(board_id, list_id, &renumbered);
        Ok(())
    }

    /// Removes a list together with its cards and closes the gap on the
    /// board
    pub async fn delete_list(&self, board_id: BoardId, list_id: ListId) -> Result<()> {
        let (removed_cards, renumbered) = {
            let _guard = self.locks.acquire(board_id).await?;
            let snapshot = self.store.load_snapshot(&board_id).await?;
            Self::list_on_board(&snapshot, list_id)
                .map_err(|_| KanbanError::list_not_found(list_id))?;

            let mut txn = Transaction::new(board_id);
            let cards = snapshot.ordered_cards(list_id);
            for card in &cards {
                txn.push(BoardChange::RemoveCard(card.id));
            }
            txn.push(BoardChange::RemoveList(list_id));

            let mut renumbered = Vec::new();
            if self.config.normalize_on_delete {
                let remaining: Vec<&List> = snapshot
                    .ordered_lists()
                    .into_iter()
                    .filter(|l| l.id != list_id)
                    .collect();
                renumbered = self.engine.normalize(board_id, &remaining).mutations;
                txn.list_updates(renumbered.iter().copied());
            }

            self.store.commit(&txn).await?;
            (cards.len(), renumbered)
        };

        info!(board = %board_id, list = %list_id, removed_cards, "deleted list");
        self.gate.publish(board_id, BoardEvent::ListDeleted { list_id });
        self.publish_lists_renumbered(board_id, &renumbered);
        Ok(())
    }

    /// Changes a list's title without touching its position
    pub async fn rename_list(
        &self,
        board_id: BoardId,
        list_id: ListId,
        title: String,
    ) -> Result<List> {
        let list = {
            let _guard = self.locks.acquire(board_id).await?;
            let snapshot = self.store.load_snapshot(&board_id).await?;

            let mut list = Self::list_on_board(&snapshot, list_id)
                .map_err(|_| KanbanError::list_not_found(list_id))?
                .clone();
            list.set_title(title);

            let mut txn = Transaction::new(board_id);
            txn.push(BoardChange::EditList(list.clone()));
            self.store.commit(&txn).await?;
            list
        };

        debug!(board = %board_id, list = %list_id, "renamed list");
        self.gate.publish(board_id, BoardEvent::ListUpdated(list.clone()));
        Ok(list)
    }

    /// Updates the title and/or description of a card. Fields left as
    /// `None` keep their current value.
    pub async fn edit_card(
        &self,
        board_id: BoardId,
        card_id: CardId,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<Card> {
        let card = {
            let _guard = self.locks.acquire(board_id).await?;
            let snapshot = self.store.load_snapshot(&board_id).await?;

            let mut card = snapshot
                .card(card_id)
                .ok_or_else(|| KanbanError::card_not_found(card_id))?
                .clone();
            if let Some(title) = title {
                card.set_title(title);
            }
            if let Some(description) = description {
                card.set_description(description);
            }

            let mut txn = Transaction::new(board_id);
            txn.push(BoardChange::EditCard(card.clone()));
            self.store.commit(&txn).await?;
            card
        };

        debug!(board = %board_id, card = %card_id, "edited card");
        self.gate.publish(board_id, BoardEvent::CardUpdated(card.clone()));
        Ok(card)
    }

    /// Renumbers the cards of one list to `1..=N`, returning how many moved
    pub async fn normalize_list(&self, board_id: BoardId, list_id: ListId) -> Result<usize> {
        let renumbered = {
            let _guard = self.locks.acquire(board_id).await?;
            let snapshot = self.store.load_snapshot(&board_id).await?;
            Self::list_on_board(&snapshot, list_id)?;

            let normalization = self
                .engine
                .normalize(list_id, &snapshot.ordered_cards(list_id));
            if !normalization.is_noop() {
                let mut txn = Transaction::new(board_id);
                txn.card_updates(normalization.mutations.iter().copied());
                self.store.commit(&txn).await?;
            }
            normalization.mutations
        };

        debug!(board = %board_id, list = %list_id, renumbered = renumbered.len(), "normalized list");
        self.publish_cards_renumbered(board_id, list_id, &renumbered);
        Ok(renumbered.len())
    }

    /// Maintenance pass: renumbers the board's lists and every list's
    /// cards in one transaction, returning how many items moved
    pub async fn normalize_board(&self, board_id: BoardId) -> Result<usize> {
        let (list_changes, card_changes) = {
            let _guard = self.locks.acquire(board_id).await?;
            let snapshot = self.store.load_snapshot(&board_id).await?;

            let lists = snapshot.ordered_lists();
            let list_changes = self.engine.normalize(board_id, &lists).mutations;
            let card_changes: Vec<(ListId, Vec<Mutation<CardId, ListId>>)> = lists
                .iter()
                .map(|list| {
                    let cards = snapshot.ordered_cards(list.id);
                    (list.id, self.engine.normalize(list.id, &cards).mutations)
                })
                .filter(|(_, mutations)| !mutations.is_empty())
                .collect();

            let mut txn = Transaction::new(board_id);
            txn.list_updates(list_changes.iter().copied());
            for (_, mutations) in &card_changes {
                txn.card_updates(mutations.iter().copied());
            }
            if !txn.is_empty() {
                self.store.commit(&txn).await?;
            }
            (list_changes, card_changes)
        };

        let total = list_changes.len()
            + card_changes
                .iter()
                .map(|(_, mutations)| mutations.len())
                .sum::<usize>();
        info!(board = %board_id, renumbered = total, "normalized board");

        self.publish_lists_renumbered(board_id, &list_changes);
        for (list_id, mutations) in &card_changes {
            self.publish_cards_renumbered(board_id, *list_id, mutations);
        }
        Ok(total)
    }

    /// Commits a move plan and derives the broadcast payload from it.
    /// `parent` is where the item sits once the plan is applied.
    async fn commit_plan<M: Member>(
        &self,
        item: &M,
        parent: M::Parent,
        plan: MutationPlan<M::Id, M::Parent>,
        txn: Transaction,
    ) -> Result<MoveOutcome<M::Id, M::Parent>> {
        let new_position = plan
            .item_change()
            .map(|change| change.position())
            .unwrap_or_else(|| item.position());

        if plan.is_noop() {
            debug!(kind = %M::KIND, item = %item.id(), "item already in place");
        } else {
            self.store.commit(&txn).await?;
            info!(
                kind = %M::KIND,
                board = %plan.board_id,
                item = %item.id(),
                parent = %parent,
                position = %new_position,
                mutations = plan.mutations.len(),
                "committed move"
            );
        }

        Ok(MoveOutcome {
            payload: MovePayload {
                item_id: item.id(),
                new_parent_id: parent,
                new_position,
            },
            plan,
        })
    }

    fn list_on_board(snapshot: &BoardSnapshot, list_id: ListId) -> Result<&List> {
        snapshot.list(list_id).ok_or_else(|| {
            KanbanError::InvalidTarget(format!(
                "list {} is not on board {}",
                list_id,
                snapshot.id()
            ))
        })
    }

    fn publish_cards_renumbered(
        &self,
        board_id: BoardId,
        list_id: ListId,
        mutations: &[Mutation<CardId, ListId>],
    ) {
        if mutations.is_empty() {
            return;
        }
        self.gate.publish(
            board_id,
            BoardEvent::CardsRenumbered(Renumbered {
                parent_id: list_id,
                positions: mutations
                    .iter()
                    .map(|m| (m.item_id, m.change.position()))
                    .collect(),
            }),
        );
    }

    fn publish_lists_renumbered(&self, board_id: BoardId, mutations: &[Mutation<ListId, BoardId>]) {
        if mutations.is_empty() {
            return;
        }
        self.gate.publish(
            board_id,
            BoardEvent::ListsRenumbered(Renumbered {
                parent_id: board_id,
                positions: mutations
                    .iter()
                    .map(|m| (m.item_id, m.change.position()))
                    .collect(),
            }),
        );
    }
}
