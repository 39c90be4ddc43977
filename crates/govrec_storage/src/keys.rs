#![forbid(unsafe_code)]

//! Storage key layout. These strings are shared with data already on the
//! ledger and must not change.

pub const SAR_HASHES_COLLECTION: &str = "sarHashes";
pub const SAR_METADATA_COLLECTION: &str = "sarMetadata";

pub fn contribution_key(round_id: &str, contributor_id: &str) -> String {
    format!("CONTRIBUTION:{round_id}:{contributor_id}")
}

pub fn round_index_key(round_id: &str) -> String {
    format!("ROUND_INDEX:{round_id}")
}

pub fn model_key(model_id: &str, version: &str) -> String {
    format!("MODEL:{model_id}:{version}")
}

pub fn model_index_key(model_id: &str) -> String {
    format!("MODEL_INDEX:{model_id}")
}

pub fn sar_key(sar_id: &str) -> String {
    format!("SAR:{sar_id}")
}

pub fn submitter_index_key(submitter_id: &str) -> String {
    format!("SUBMITTER_INDEX:{submitter_id}")
}
