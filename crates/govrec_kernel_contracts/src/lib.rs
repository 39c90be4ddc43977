#![forbid(unsafe_code)]

pub mod common;
pub mod contribution;
pub mod index;
pub mod model;
pub mod sar;
pub mod validation;
pub mod version;
pub mod wire;

pub use common::{ContractViolation, Validate};
pub use index::{IndexOrder, RecordIndex};
pub use version::{compare_versions, ModelVersion};
