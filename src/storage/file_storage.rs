use crate::{
    domain::{Board, BoardId, BoardSnapshot},
    error::{KanbanError, Result},
    storage::{apply_transaction, BoardStore, Transaction},
};
use async_trait::async_trait;
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};
use tokio::fs;
use tracing::debug;

/// File-based storage: one JSON document per board.
///
/// Writes go to a temporary file which is then renamed over the board file,
/// so a crash mid-commit leaves either the old or the new board on disk.
/// The store does not lock; callers serialize writers per board.
pub struct FileStore {
    root_path: PathBuf,
}

impl FileStore {
    const KANBAN_DIR: &'static str = ".kanban";
    const BOARDS_DIR: &'static str = "boards";

    /// Creates a new FileStore for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::KANBAN_DIR),
        }
    }

    fn boards_dir(&self) -> PathBuf {
        self.root_path.join(Self::BOARDS_DIR)
    }

    fn board_file(&self, id: &BoardId) -> PathBuf {
        self.boards_dir().join(format!("{}.json", id))
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    /// Creates the directory layout
    pub async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.boards_dir()).await
    }

    pub async fn is_initialized(&self) -> bool {
        self.boards_dir().exists()
    }

    /// Lists the ids of every stored board
    pub async fn list_board_ids(&self) -> Result<Vec<BoardId>> {
        let boards_dir = self.boards_dir();

        if !boards_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&boards_dir).await?;
        let mut ids: Vec<BoardId> = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if let Ok(id) = BoardId::from_str(stem) {
                        ids.push(id);
                    }
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    async fn write_snapshot(&self, snapshot: &BoardSnapshot) -> Result<()> {
        self.ensure_directory_exists(&self.boards_dir()).await?;

        let json = serde_json::to_string_pretty(snapshot)?;
        let file_path = self.board_file(&snapshot.id());
        // unique per call so overlapping writers never share a temp file
        let tmp_path = file_path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4()));

        let written = match fs::write(&tmp_path, json).await {
            Ok(()) => fs::rename(&tmp_path, &file_path).await,
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                debug!(path = %tmp_path.display(), error = %cleanup, "temp file not removed");
            }
            return Err(err.into());
        }
        Ok(())
    }
}

#[async_trait]
impl BoardStore for FileStore {
    async fn create_board(&self, board: &Board) -> Result<()> {
        if self.board_file(&board.id).exists() {
            return Err(KanbanError::StorageError(format!(
                "board {} already exists",
                board.id
            )));
        }
        self.write_snapshot(&BoardSnapshot::new(board.clone())).await
    }

    async fn load_snapshot(&self, board_id: &BoardId) -> Result<BoardSnapshot> {
        let file_path = self.board_file(board_id);

        if !file_path.exists() {
            return Err(KanbanError::BoardNotFound(board_id.to_string()));
        }

        let contents = fs::read_to_string(&file_path).await?;
        let snapshot: BoardSnapshot = serde_json::from_str(&contents)?;

        Ok(snapshot)
    }

    async fn commit(&self, txn: &Transaction) -> Result<()> {
        let mut snapshot = self.load_snapshot(&txn.board_id).await?;
        apply_transaction(&mut snapshot, txn)?;
        self.write_snapshot(&snapshot).await?;

        debug!(board = %txn.board_id, changes = txn.changes.len(), "committed board file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Card, List, Position},
        engine::Mutation,
        storage::BoardChange,
    };
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_storage_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        assert!(!store.is_initialized().await);

        store.initialize().await.unwrap();

        assert!(store.is_initialized().await);
        assert!(store.boards_dir().exists());
    }

    #[tokio::test]
    async fn test_board_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        let board = Board::new("Release".to_string());
        store.create_board(&board).await.unwrap();

        let loaded = store.load_snapshot(&board.id).await.unwrap();
        assert_eq!(loaded.board.title, "Release");
        assert_eq!(store.list_board_ids().await.unwrap(), vec![board.id]);
    }

    #[tokio::test]
    async fn test_commit_survives_reload() {
        let temp_dir = TempDir::new().unwrap();
        let board = Board::new("Release".to_string());
        let list = List::new(board.id, "Todo".to_string(), Position::BASE);
        let card = Card::new(board.id, list.id, "Ship".to_string(), Position::BASE);

        {
            let store = FileStore::new(temp_dir.path());
            store.create_board(&board).await.unwrap();

            let mut txn = Transaction::new(board.id);
            txn.push(BoardChange::InsertList(list.clone()));
            txn.push(BoardChange::InsertCard(card.clone()));
            txn.card_updates([Mutation::reposition(card.id, Position::new(0.5).unwrap())]);
            store.commit(&txn).await.unwrap();
        }

        let store = FileStore::new(temp_dir.path());
        let snapshot = store.load_snapshot(&board.id).await.unwrap();
        assert_eq!(snapshot.lists.len(), 1);
        assert_eq!(snapshot.card(card.id).unwrap().position.value(), 0.5);
        let entries: Vec<_> = std::fs::read_dir(store.boards_dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from(format!("{}.json", board.id))]);
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        let board = Board::new("Release".to_string());
        store.create_board(&board).await.unwrap();

        let mut txn = Transaction::new(board.id);
        txn.push(BoardChange::RemoveList(crate::domain::ListId::new()));

        assert!(store.commit(&txn).await.is_err());
        let snapshot = store.load_snapshot(&board.id).await.unwrap();
        assert!(snapshot.lists.is_empty());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        store.initialize().await.unwrap();

        let snapshot = BoardSnapshot::new(Board::new("Blocked".to_string()));
        // a directory in place of the board file makes the rename fail
        std::fs::create_dir(store.board_file(&snapshot.id())).unwrap();

        assert!(store.write_snapshot(&snapshot).await.is_err());

        let leftovers: Vec<_> = std::fs::read_dir(store.boards_dir())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty(), "left behind {:?}", leftovers);
    }

    #[tokio::test]
    async fn test_missing_board() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        let err = store.load_snapshot(&BoardId::new()).await.unwrap_err();
        assert!(matches!(err, KanbanError::BoardNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_board_ids_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        assert!(store.list_board_ids().await.unwrap().is_empty());
    }
}
