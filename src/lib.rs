pub mod commands;
pub mod config;
pub mod core;
pub mod services;

pub use crate::config::FlowConfig;
pub use crate::core::photo::{Decision, DuplicateGroup, Photo};
pub use crate::core::store::{FileStateStore, MemoryStateStore, SessionState, StateStore};
