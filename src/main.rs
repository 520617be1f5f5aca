use dotenv::dotenv;
use log::{error, info, warn};
use std::time::Duration;

mod config;
mod error;
mod models;
mod services;
mod utils;

use crate::config::Config;
use crate::services::aggregator;
use crate::services::share_calculator::PayoutParams;
use crate::services::{report, tezos_rpc};
use crate::utils::cancel::cancel_pair;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    info!("Starting delegation payout run");
    let config = Config::from_env()?;

    let rpc = tezos_rpc::create_tezos_connection(
        &config.primary_rpc,
        config.secondary_rpc.as_deref(),
        config.chain,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let (cancel_handle, cancel) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling after the current request");
            cancel_handle.cancel();
        }
    });

    let mut records = aggregator::seed_records(
        &rpc,
        &config.delegate_address,
        config.seed_mode,
        config.cycle_start,
        config.cycle_end,
        config.spillage_order,
    )
    .await?;
    info!("Working set has {} records", records.len());

    let params = PayoutParams {
        delegate: config.delegate_address.clone(),
        rate: config.fee_rate,
        spillage: config.spillage,
        parallel_limit: config.parallel_limit,
    };

    if let Err(e) = aggregator::calculate_cycles(
        &rpc,
        &mut records,
        config.cycle_start,
        config.cycle_end,
        &params,
        &cancel,
    )
    .await
    {
        if cancel.is_cancelled() {
            warn!("Run was interrupted");
        }
        error!("{}", e);
        let done = records
            .iter()
            .map(|record| record.cycle_entries.len())
            .min()
            .unwrap_or(0);
        error!("{} cycle(s) completed before the failure", done);
        return Err(e.into());
    }

    for record in &records {
        info!(
            "{}{}: total payout {}, fees {}",
            record.address,
            if record.is_delegate { " (delegate)" } else { "" },
            record.total_payout,
            record.accumulated_fee
        );
    }

    let batch = report::assemble_batch(&rpc, &records, &config.delegate_address).await?;
    println!("{}", report::render(&batch)?);

    info!("Payout run complete. The batch was not broadcast.");
    Ok(())
}
