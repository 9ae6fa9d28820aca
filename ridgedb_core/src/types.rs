use serde::{Deserialize, Serialize};

/// A row is a vector of values, one per column. The data model has exactly
/// one value type (a variable-length byte string); arity is enforced at the
/// table-store boundary, not encoded in the type.
pub type Row = Vec<String>;

/// Client-declared isolation intent. Recorded in the WAL and surfaced back
/// to callers; has no runtime effect on visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "readuncommitted" => Some(Self::ReadUncommitted),
            "readcommitted" => Some(Self::ReadCommitted),
            "repeatableread" => Some(Self::RepeatableRead),
            "serializable" => Some(Self::Serializable),
            _ => None,
        }
    }
}

impl std::fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ReadUncommitted => "ReadUncommitted",
            Self::ReadCommitted => "ReadCommitted",
            Self::RepeatableRead => "RepeatableRead",
            Self::Serializable => "Serializable",
        };
        f.write_str(s)
    }
}

/// Lifecycle state of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Active,
    Committed,
    RolledBack,
    Aborted,
}
