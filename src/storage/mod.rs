//! SQLite persistence for state that outlives a single run: the session
//! token and the chat conversation history.

mod db;

pub use db::{Database, StoredMessage, StoredSession};
