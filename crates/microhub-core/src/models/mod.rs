//! Data models for MicroHub

mod collection;
mod connection;
mod journal;
mod movie;
mod preferences;
mod task;

pub use collection::{Entity, EntityCollection, EntityId};
pub use connection::{Connection, StoreTarget};
pub use journal::{extract_hashtags, JournalEntry};
pub use movie::{Movie, MovieMetadata, WatchStatus};
pub use preferences::{Route, Theme, DEFAULT_USERNAME};
pub use task::{Priority, Task, TaskStatus};
