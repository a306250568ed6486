//! projgate-storage: Storage abstraction layer
//!
//! This crate provides the storage abstraction for projgate access data:
//! - DataStore trait covering the reads the resolver needs and the writes
//!   the surrounding application performs
//! - In-memory implementation for testing and embedded use
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              projgate-storage               │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs   - DataStore trait definition   │
//! │  memory.rs   - In-memory implementation     │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::MemoryDataStore;
pub use traits::{DataStore, StoredGroup, StoredUser};
