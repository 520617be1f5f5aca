pub mod aggregator;
pub mod gateway;
pub mod payout;
pub mod report;
pub mod share_calculator;
pub mod tezos_rpc;

#[cfg(test)]
pub mod mock_gateway;
