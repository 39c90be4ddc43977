#![forbid(unsafe_code)]

pub mod authz;
pub mod config;
pub mod contribution;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod model_registry;
pub mod sar_anchor;

pub use authz::{AccessDecision, Operation};
pub use config::{GovernanceConfig, ReacknowledgePolicy};
pub use dispatch::invoke;
pub use engine::GovernedRecordEngine;
pub use error::EngineError;
