use crate::{
    domain::BoardId,
    error::{KanbanError, Result},
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{trace, warn};

/// Idle entries are swept once the map grows past this many boards
const PRUNE_THRESHOLD: usize = 1024;

/// Per-board mutual exclusion for read-plan-apply cycles.
///
/// Each board gets its own mutex, so requests on unrelated boards never
/// wait on each other. Waiting is bounded by the configured timeout.
#[derive(Debug)]
pub struct BoardLocks {
    timeout: Duration,
    locks: Mutex<HashMap<BoardId, Arc<Mutex<()>>>>,
}

/// Held for the duration of one operation on a board
#[derive(Debug)]
pub struct BoardGuard {
    board_id: BoardId,
    _guard: OwnedMutexGuard<()>,
}

impl BoardGuard {
    pub fn board_id(&self) -> BoardId {
        self.board_id
    }
}

impl BoardLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Waits for exclusive access to a board
    pub async fn acquire(&self, board_id: BoardId) -> Result<BoardGuard> {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() >= PRUNE_THRESHOLD {
                Self::prune_idle(&mut locks);
            }
            locks
                .entry(board_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        match tokio::time::timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => {
                trace!(board = %board_id, "board lock acquired");
                Ok(BoardGuard {
                    board_id,
                    _guard: guard,
                })
            }
            Err(_) => {
                let waited_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(board = %board_id, waited_ms, "timed out waiting for board lock");
                Err(KanbanError::ConcurrencyTimeout {
                    board: board_id.to_string(),
                    waited_ms,
                })
            }
        }
    }

    /// Drops entries nobody is holding or waiting on
    fn prune_idle(locks: &mut HashMap<BoardId, Arc<Mutex<()>>>) {
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub async fn tracked_boards(&self) -> usize {
        self.locks.lock().await.len()
    }
}
