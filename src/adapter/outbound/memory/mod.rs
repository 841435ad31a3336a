//! In-process adapters for single-process runs and tests.

mod cache;
mod dispatch;
mod history;

pub use cache::MemoryCache;
pub use dispatch::MemoryDispatcher;
pub use history::MemoryHistory;
