use crate::error::{Operation, PayoutError};
use crate::models::{DelegatorRecord, TransactionBatch, TransferOp};
use crate::services::gateway::ChainGateway;
use crate::utils::helpers::tez_to_mutez;
use log::info;

const TRANSFER_FEE: &str = "1";
const TRANSFER_GAS_LIMIT: &str = "100";
const TRANSFER_STORAGE_LIMIT: &str = "0";
const TRANSFER_COUNTER: &str = "0";

/// One transfer per delegator owed a nonzero amount, paid from `source`.
pub fn build_batch(records: &[DelegatorRecord], source: &str, branch: &str) -> TransactionBatch {
    let contents = records
        .iter()
        .filter(|record| !record.is_delegate && record.address != source)
        .filter_map(|record| {
            let amount = tez_to_mutez(record.total_payout);
            (amount != 0).then(|| TransferOp {
                kind: "transaction".to_string(),
                amount: amount.to_string(),
                source: source.to_string(),
                destination: record.address.clone(),
                storage_limit: TRANSFER_STORAGE_LIMIT.to_string(),
                gas_limit: TRANSFER_GAS_LIMIT.to_string(),
                fee: TRANSFER_FEE.to_string(),
                counter: TRANSFER_COUNTER.to_string(),
            })
        })
        .collect();

    TransactionBatch {
        contents,
        branch: branch.to_string(),
    }
}

pub async fn assemble_batch<G: ChainGateway + ?Sized>(
    gateway: &G,
    records: &[DelegatorRecord],
    delegate: &str,
) -> Result<TransactionBatch, PayoutError> {
    let head = gateway
        .head_block()
        .await
        .map_err(|source| PayoutError::Head {
            operation: Operation::HeadBlock,
            source,
        })?;
    info!(
        "Anchoring payout batch at block {} (level {}, {})",
        head.hash, head.level, head.timestamp
    );
    Ok(build_batch(records, delegate, &head.hash))
}

pub fn render(batch: &TransactionBatch) -> serde_json::Result<String> {
    serde_json::to_string_pretty(batch)
}
