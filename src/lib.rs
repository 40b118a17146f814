//! # Kanban Core
//!
//! Ordering engine for kanban boards: boards hold ordered lists, lists hold
//! ordered cards, and cards and lists are reordered by drag-and-drop.
//!
//! The [`engine`] plans moves as pure functions over a board snapshot. The
//! [`service`] runs each plan under a per-board lock, commits it through a
//! [`storage::BoardStore`] and announces the result through a
//! [`broadcast::BroadcastGate`].

pub mod broadcast;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use broadcast::{BoardEvent, BroadcastGate, BroadcastHub, MovePayload};
pub use config::{OrderingConfig, ServiceConfig};
pub use domain::{Board, BoardId, BoardSnapshot, Card, CardId, List, ListId, Position};
pub use engine::{Change, Destination, MoveEngine, Mutation, MutationPlan};
pub use error::{KanbanError, Result};
pub use service::{BoardService, MoveCard, MoveList, MoveOutcome, MoveRequest};
pub use storage::{BoardStore, MemoryStore, Transaction};
