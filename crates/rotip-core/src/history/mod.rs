//! IP history store implementations
//!
//! This module provides implementations of the IpHistoryStore trait for
//! different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileHistoryStore;
pub use memory::MemoryHistoryStore;
