//! Container lifecycle reconciliation for minehost.
//!
//! This crate turns operator intent (create, start, stop, restart) into calls
//! against the container engine and keeps each server's persisted status in
//! line with that intent. [`LifecycleController`] drives the mutating actions
//! and degrades to "simulation mode" when the engine cannot be reached;
//! [`StatusReconciler`] answers status reads from the engine's live view,
//! falling back to the last persisted status. [`Manager`] wires both to a
//! store and an engine built from a [`HostConfig`].

pub mod action;
pub mod concurrency;
pub mod config;
pub mod controller;
pub mod lifecycle;
pub mod manager;
pub mod reconcile;

pub use action::Action;
pub use concurrency::ServerLocks;
pub use config::HostConfig;
pub use controller::{ActionOutcome, CreateOutcome, LifecycleController, Outcome};
pub use lifecycle::{plan, EngineStep, LifecycleState, Plan};
pub use manager::Manager;
pub use reconcile::{ObservedStatus, StatusReconciler};

use minehost_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("server not found: {0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(StoreError),
    #[error("config error: {0}")]
    Config(String),
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ServerNotFound(id) => CoreError::NotFound(id),
            StoreError::InvalidId(msg) | StoreError::InvalidRecord(msg) => {
                CoreError::Validation(msg)
            }
            other => CoreError::Store(other),
        }
    }
}
