use core::cell::{Cell, Ref, RefCell};
use core::convert::Infallible;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    /// A move is being applied or presented; new requests are dropped.
    Processing,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveReply {
    /// Another move was still in flight, nothing happened.
    Ignored,
    /// The move was evaluated; `moved` tells whether it changed the grid.
    Done(MoveResult),
}

impl MoveReply {
    pub const fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }

    pub fn result(&self) -> Option<&MoveResult> {
        match self {
            Self::Ignored => None,
            Self::Done(result) => Some(result),
        }
    }

    pub fn into_result(self) -> Option<MoveResult> {
        match self {
            Self::Ignored => None,
            Self::Done(result) => Some(result),
        }
    }
}

/// Marks the session as processing for as long as it lives, including during unwinding.
struct BusyGuard<'a> {
    state: &'a Cell<SessionState>,
}

impl<'a> BusyGuard<'a> {
    fn acquire(state: &'a Cell<SessionState>) -> Option<Self> {
        match state.get() {
            SessionState::Processing => None,
            SessionState::Idle => {
                state.set(SessionState::Processing);
                Some(Self { state })
            }
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.set(SessionState::Idle);
    }
}

/// Serializes moves against a [`GridEngine`] and keeps the persistence backend in sync.
///
/// All operations take `&self` so a presentation callback holding the same
/// session can call back in while a move is in flight; such calls are ignored.
#[derive(Debug)]
pub struct MoveSession<P: Persistence> {
    engine: RefCell<GridEngine>,
    store: RefCell<P>,
    state: Cell<SessionState>,
}

impl<P: Persistence> MoveSession<P> {
    /// Loads the best score and any saved game from `store`, resuming it when
    /// it is valid and unfinished, otherwise starting a new game.
    pub fn new(config: EngineConfig, seed: u64, mut store: P) -> Self {
        let best_score = store.load_best_score().unwrap_or_else(|err| {
            log::error!("Could not load best score: {:?}", err);
            0
        });

        let session = Self {
            engine: RefCell::new(GridEngine::new(config, seed, best_score)),
            store: RefCell::new(store),
            state: Cell::new(SessionState::Idle),
        };
        session.resume_or_start();
        session
    }

    fn resume_or_start(&self) {
        let saved = match self.store.borrow_mut().load_game_state() {
            Ok(saved) => saved,
            Err(err) => {
                log::error!("Could not load saved game: {:?}", err);
                None
            }
        };

        let mut engine = self.engine.borrow_mut();
        let best_before = engine.best_score();
        let resumed = match saved {
            None => false,
            Some(saved) => match engine.restore(&saved) {
                Ok(()) if engine.state().is_empty() || engine.state().is_finished() => {
                    log::debug!("saved game is {:?}, starting over", engine.state());
                    false
                }
                Ok(()) => {
                    log::debug!("resumed game at score {}", engine.score());
                    true
                }
                Err(err) => {
                    log::warn!("Discarding saved game: {}", err);
                    if let Err(err) = self.store.borrow_mut().clear_game_state() {
                        log::error!("Could not clear saved game: {:?}", err);
                    }
                    false
                }
            },
        };

        if !resumed {
            engine.new_game();
        }
        let best = engine.best_score();
        let saved = engine.to_saved();
        drop(engine);

        if best > best_before {
            self.save_best_score(best);
        }
        if !resumed {
            self.save_game_state(&saved);
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state.get(), SessionState::Processing)
    }

    /// Read access to the engine, e.g. for rendering.
    pub fn engine(&self) -> Ref<'_, GridEngine> {
        self.engine.borrow()
    }

    pub fn store(&self) -> Ref<'_, P> {
        self.store.borrow()
    }

    pub fn into_parts(self) -> (GridEngine, P) {
        (self.engine.into_inner(), self.store.into_inner())
    }

    pub fn request_move(&self, direction: Direction) -> MoveReply {
        match self.request_move_with(direction, |_| Ok::<(), Infallible>(())) {
            Ok(reply) => reply,
            Err(never) => match never {},
        }
    }

    /// Applies a move and runs `present` on its result before the session goes idle again.
    ///
    /// `present` runs only for moves that changed the grid. If it fails or
    /// panics the move stays applied and the session still returns to idle.
    pub fn request_move_with<E, F>(
        &self,
        direction: Direction,
        present: F,
    ) -> core::result::Result<MoveReply, E>
    where
        F: FnOnce(&MoveResult) -> core::result::Result<(), E>,
    {
        let Some(_busy) = BusyGuard::acquire(&self.state) else {
            log::trace!("ignoring {}: move in flight", direction);
            return Ok(MoveReply::Ignored);
        };

        let result = self.run_move(direction);
        if result.moved {
            present(&result)?;
        }
        Ok(MoveReply::Done(result))
    }

    fn run_move(&self, direction: Direction) -> MoveResult {
        let mut engine = self.engine.borrow_mut();
        let plan = engine.attempt_move(direction);
        if !plan.moved() {
            log::trace!("{} has no effect", direction);
            return plan.into_result();
        }

        let best_before = engine.best_score();
        let mut result = engine.apply(plan);
        result.spawned = engine.spawn_tile();
        engine.refresh_state();
        result.is_win = engine.is_win();
        result.is_game_over = engine.is_game_over();

        let best = engine.best_score();
        let saved = engine.to_saved();
        drop(engine);

        if best > best_before {
            self.save_best_score(best);
        }
        self.save_game_state(&saved);
        result
    }

    /// Reverts the last move. Returns false when busy or when there is nothing to undo.
    pub fn undo(&self) -> bool {
        let Some(_busy) = BusyGuard::acquire(&self.state) else {
            log::trace!("ignoring undo: move in flight");
            return false;
        };

        let mut engine = self.engine.borrow_mut();
        if !engine.undo() {
            return false;
        }
        let saved = engine.to_saved();
        drop(engine);

        self.save_game_state(&saved);
        true
    }

    /// Starts over with a fresh board. Returns false when busy.
    pub fn new_game(&self) -> bool {
        let Some(_busy) = BusyGuard::acquire(&self.state) else {
            log::trace!("ignoring new game: move in flight");
            return false;
        };

        let mut engine = self.engine.borrow_mut();
        engine.new_game();
        let saved = engine.to_saved();
        drop(engine);

        self.save_game_state(&saved);
        true
    }

    fn save_best_score(&self, best_score: Score) {
        log::debug!("new best score: {}", best_score);
        if let Err(err) = self.store.borrow_mut().save_best_score(best_score) {
            log::error!("Could not save best score: {:?}", err);
        }
    }

    fn save_game_state(&self, saved: &SavedGame) {
        if let Err(err) = self.store.borrow_mut().save_game_state(saved) {
            log::error!("Could not save game: {:?}", err);
        }
    }
}
