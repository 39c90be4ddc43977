#![forbid(unsafe_code)]

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::compare_versions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrder {
    /// Members keep the order they were first added in.
    Insertion,
    /// Members are version strings kept ascending by `compare_versions`;
    /// the last member is the latest version.
    Version,
}

/// A secondary index stored as one JSON document: an owner id plus an
/// ordered, duplicate-free member list.
pub trait RecordIndex: Serialize + DeserializeOwned {
    fn empty(owner: &str) -> Self;
    fn members(&self) -> &[String];
    fn members_mut(&mut self) -> &mut Vec<String>;

    fn contains(&self, member: &str) -> bool {
        self.members().iter().any(|m| m == member)
    }

    fn latest(&self) -> Option<&str> {
        self.members().last().map(String::as_str)
    }

    /// Adds `member` if absent. Returns whether the index changed.
    fn insert_member(&mut self, member: &str, order: IndexOrder) -> bool {
        if self.contains(member) {
            return false;
        }
        let members = self.members_mut();
        members.push(member.to_string());
        if order == IndexOrder::Version {
            // Full stable sort also repairs an index persisted out of order.
            members.sort_by(|a, b| compare_versions(a, b));
        }
        true
    }
}
