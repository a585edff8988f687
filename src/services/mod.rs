//! Service layer for business logic.
//!
//! This module contains the read-only resolver, the reorder engine and the
//! persistence plumbing used by the configuration store.

pub mod persistence;
pub mod reorder;
pub mod resolver;

// Re-export commonly used types and functions
pub use persistence::{
    BoxFuture, FilePersistence, MemoryPersistence, PersistenceGateway, PersistenceStatus,
    SaveScheduler,
};
pub use reorder::{compute_reorder, effective_order, move_one_step, Direction, MovedItem, ReorderResult};
pub use resolver::{search_filter, CustomEntityView, DeviceView, EntityEnablementResolver, EntityView};
