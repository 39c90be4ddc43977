#![forbid(unsafe_code)]

#[derive(Debug, Clone, PartialEq)]
pub enum ContractViolation {
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
    NotFinite {
        field: &'static str,
    },
    /// The field did not parse as JSON at all. Shape problems on a payload
    /// that did parse are reported as `InvalidValue`.
    MalformedPayload {
        field: &'static str,
    },
}

impl ContractViolation {
    pub fn field(&self) -> &'static str {
        match self {
            ContractViolation::InvalidValue { field, .. }
            | ContractViolation::NotFinite { field }
            | ContractViolation::MalformedPayload { field } => field,
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ContractViolation>;
}
