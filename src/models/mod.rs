mod block_head;
mod delegator_record;
mod snapshot;
mod transaction_batch;

pub use block_head::BlockHead;
pub use delegator_record::{CycleEntry, DelegatorRecord};
pub use snapshot::{FrozenBalance, SnapshotRef};
pub use transaction_batch::{TransactionBatch, TransferOp};

/// Amounts in display units (tez).
pub type Amount = f64;
