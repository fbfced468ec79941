use merge2048_core::{Persistence, SavedGame, Score};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not parse {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Keeps the best score and the current game as JSON files in one directory.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub const BEST_SCORE_FILE: &'static str = "best_score.json";
    pub const GAME_FILE: &'static str = "game.json";

    /// Uses `dir` for storage, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let path = self.dir.join(name);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StoreError::Json { path, source })
    }

    /// Writes through a temporary file so a crash never leaves half a file behind.
    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let path = self.dir.join(name);
        let text = serde_json::to_string(value).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, text)
            .and_then(|()| fs::rename(&tmp, &path))
            .map_err(|source| StoreError::Io { path, source })
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        let path = self.dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

impl Persistence for JsonFileStore {
    type Error = StoreError;

    fn load_best_score(&mut self) -> Result<Score, Self::Error> {
        Ok(self.read_json(Self::BEST_SCORE_FILE)?.unwrap_or(0))
    }

    fn save_best_score(&mut self, best_score: Score) -> Result<(), Self::Error> {
        self.write_json(Self::BEST_SCORE_FILE, &best_score)
    }

    fn load_game_state(&mut self) -> Result<Option<SavedGame>, Self::Error> {
        self.read_json(Self::GAME_FILE)
    }

    fn save_game_state(&mut self, state: &SavedGame) -> Result<(), Self::Error> {
        self.write_json(Self::GAME_FILE, state)
    }

    fn clear_game_state(&mut self) -> Result<(), Self::Error> {
        self.remove(Self::GAME_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merge2048_core::{Direction, EngineConfig, MoveSession};
    use tempfile::tempdir;

    #[test]
    fn missing_files_read_as_fresh() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::open(dir.path().join("state")).unwrap();

        assert_eq!(store.load_best_score().unwrap(), 0);
        assert!(store.load_game_state().unwrap().is_none());
        store.clear_game_state().unwrap();
    }

    #[test]
    fn saves_are_readable_json() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::open(dir.path()).unwrap();
        let saved = SavedGame {
            grid: vec![0, 2, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            score: 16,
            best_score: 32,
        };

        store.save_game_state(&saved).unwrap();
        store.save_best_score(32).unwrap();

        let raw = fs::read_to_string(dir.path().join(JsonFileStore::GAME_FILE)).unwrap();
        assert!(raw.contains("\"bestScore\":32"));
        assert_eq!(store.load_game_state().unwrap(), Some(saved));
        assert_eq!(store.load_best_score().unwrap(), 32);

        store.clear_game_state().unwrap();
        assert!(store.load_game_state().unwrap().is_none());
    }

    #[test]
    fn corrupt_game_file_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(JsonFileStore::GAME_FILE), "{ not json").unwrap();
        let mut store = JsonFileStore::open(dir.path()).unwrap();

        assert!(matches!(
            store.load_game_state(),
            Err(StoreError::Json { .. })
        ));
    }

    #[test]
    fn session_resumes_from_disk() {
        let dir = tempdir().unwrap();
        let first = MoveSession::new(
            EngineConfig::CLASSIC,
            1,
            JsonFileStore::open(dir.path()).unwrap(),
        );
        for direction in Direction::ALL {
            first.request_move(direction);
        }
        let (engine, _) = first.into_parts();

        let second = MoveSession::new(
            EngineConfig::CLASSIC,
            2,
            JsonFileStore::open(dir.path()).unwrap(),
        );
        assert_eq!(second.engine().grid(), engine.grid());
        assert_eq!(second.engine().score(), engine.score());
        assert_eq!(second.engine().best_score(), engine.best_score());
    }

    #[test]
    fn invalid_saved_grid_starts_fresh_and_is_replaced() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(JsonFileStore::GAME_FILE),
            r#"{"grid":[3,0,0],"score":0,"bestScore":0}"#,
        )
        .unwrap();

        let session = MoveSession::new(
            EngineConfig::CLASSIC,
            1,
            JsonFileStore::open(dir.path()).unwrap(),
        );

        assert_eq!(session.engine().empty_count(), 14);
        let mut store = JsonFileStore::open(dir.path()).unwrap();
        let saved = store.load_game_state().unwrap().unwrap();
        assert!(saved.validate().is_ok());
    }
}
