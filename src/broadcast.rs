//! Realtime fan-out of committed board changes.

use crate::{
    config::ServiceConfig,
    domain::{BoardId, Card, CardId, List, ListId, Position},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};
use tokio::sync::broadcast;
use tracing::trace;

/// Minimal payload announcing where an item ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload<I, P> {
    pub item_id: I,
    pub new_parent_id: P,
    pub new_position: Position,
}

/// New positions of a parent's members after it was renumbered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Renumbered<I, P> {
    pub parent_id: P,
    pub positions: Vec<(I, Position)>,
}

/// Events delivered to a board's subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum BoardEvent {
    #[serde(rename = "card:created")]
    CardCreated(Card),
    #[serde(rename = "card:moved")]
    CardMoved(MovePayload<CardId, ListId>),
    #[serde(rename = "card:updated")]
    CardUpdated(Card),
    #[serde(rename = "card:deleted", rename_all = "camelCase")]
    CardDeleted { card_id: CardId, list_id: ListId },
    #[serde(rename = "cards:renumbered")]
    CardsRenumbered(Renumbered<CardId, ListId>),
    #[serde(rename = "list:created")]
    ListCreated(List),
    #[serde(rename = "list:moved")]
    ListMoved(MovePayload<ListId, BoardId>),
    #[serde(rename = "list:updated")]
    ListUpdated(List),
    #[serde(rename = "list:deleted", rename_all = "camelCase")]
    ListDeleted { list_id: ListId },
    #[serde(rename = "lists:renumbered")]
    ListsRenumbered(Renumbered<ListId, BoardId>),
}

/// Receives committed changes for delivery to a board's subscribers.
///
/// Publishing never fails the operation that produced the event: the
/// change is already committed by the time the gate sees it.
pub trait BroadcastGate: Send + Sync {
    fn publish(&self, board_id: BoardId, event: BoardEvent);
}

impl<G: BroadcastGate + ?Sized> BroadcastGate for Arc<G> {
    fn publish(&self, board_id: BoardId, event: BoardEvent) {
        (**self).publish(board_id, event)
    }
}

pub type EventReceiver = broadcast::Receiver<Arc<BoardEvent>>;

/// A broadcast channel per board, created on first subscription.
///
/// Events for boards nobody subscribed to are dropped, and a board's
/// channel is removed once its last subscriber has gone.
#[derive(Debug)]
pub struct BroadcastHub {
    capacity: usize,
    channels: RwLock<HashMap<BoardId, broadcast::Sender<Arc<BoardEvent>>>>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Sizes each board's channel by `broadcast_capacity`
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.broadcast_capacity)
    }

    /// Joins the subscriber group of a board
    pub fn subscribe(&self, board_id: BoardId) -> EventReceiver {
        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        channels
            .entry(board_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of live subscribers of a board
    pub fn subscriber_count(&self, board_id: BoardId) -> usize {
        self.channels
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&board_id)
            .map_or(0, |sender| sender.receiver_count())
    }

    /// Drops a board's channel unless someone subscribed in the meantime
    fn remove_if_idle(&self, board_id: BoardId) {
        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if channels
            .get(&board_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(&board_id);
            trace!(board = %board_id, "last subscriber left, channel removed");
        }
    }

    /// Number of boards with an open channel
    pub fn channel_count(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::from_config(&ServiceConfig::default())
    }
}

impl BroadcastGate for BroadcastHub {
    fn publish(&self, board_id: BoardId, event: BoardEvent) {
        let delivered = {
            let channels = self
                .channels
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            match channels.get(&board_id) {
                Some(sender) => sender.send(Arc::new(event)).is_ok(),
                None => {
                    trace!(board = %board_id, "no subscribers, event dropped");
                    return;
                }
            }
        };

        // a failed send only means every receiver has gone away
        if !delivered {
            self.remove_if_idle(board_id);
        }
    }
}
