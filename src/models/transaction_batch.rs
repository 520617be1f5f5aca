use serde::{Deserialize, Serialize};

/// A transfer operation as the node's forge endpoint expects it.
/// Amounts and limits are decimal strings in minimal units.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TransferOp {
    pub kind: String,
    pub amount: String,
    pub source: String,
    pub destination: String,
    pub storage_limit: String,
    pub gas_limit: String,
    pub fee: String,
    pub counter: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TransactionBatch {
    pub contents: Vec<TransferOp>,
    pub branch: String,
}
