// ============================================================================
// Interfaces Module
// Trait contracts between the engine and its collaborators
// ============================================================================

mod event_handler;

pub use event_handler::{EngineEvent, EventHandler, LoggingEventHandler, NoOpEventHandler};
