/// Registry of running games.
pub mod engine;
/// Per-game actor.
pub mod game;
/// Phase state machine.
pub mod phase;
/// Content of the messages a game shows.
pub mod render;
/// Guesser rotation.
pub mod rotation;
/// Routing of inbound actions to games.
pub mod router;
/// Chat platform boundary.
pub mod session;
mod sse;
#[cfg(test)]
pub(crate) mod testing;
/// Hurry-able countdowns.
pub mod timer;
/// Secret word pools.
pub mod words;

use std::sync::Arc;

use crate::{config::AppConfig, services::sse_session::SseSession};

pub use self::engine::{ActionOutcome, Engine};
pub use self::sse::SseHub;
use self::words::WordCatalog;

/// Application state shared by every handler.
pub type SharedState = Arc<AppState>;

/// Capacity of the broadcast channel behind the event stream.
const EVENT_CAPACITY: usize = 64;

/// Central application state: the game engine and the stream it talks through.
pub struct AppState {
    engine: Engine,
    events: Arc<SseHub>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// Games started later use `config.game` as their options and draw from
    /// `config.word_pools`.
    pub fn new(config: AppConfig) -> SharedState {
        let events = Arc::new(SseHub::new(EVENT_CAPACITY));
        let session = Arc::new(SseSession::new(Arc::clone(&events)));
        let engine = Engine::new(session, WordCatalog::new(config.word_pools), config.game);
        Arc::new(Self { engine, events })
    }

    /// Engine owning every running game.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Broadcast hub carrying outward session events.
    pub fn events(&self) -> &SseHub {
        &self.events
    }
}
