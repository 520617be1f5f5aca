use crate::error::GatewayError;
use crate::models::Amount;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};
use std::str::FromStr;

pub const MUTEZ_PER_TEZ: u64 = 1_000_000;

/// Converts a decimal minimal-unit string from the node into display units.
pub fn mutez_to_tez(raw: &str) -> Result<Amount, GatewayError> {
    let invalid = || GatewayError::Amount {
        value: raw.to_string(),
    };
    let mutez = BigInt::from_str(raw.trim()).map_err(|_| invalid())?;
    if mutez.is_negative() {
        return Err(invalid());
    }
    let whole = (&mutez / MUTEZ_PER_TEZ).to_f64().ok_or_else(invalid)?;
    let fraction = (&mutez % MUTEZ_PER_TEZ).to_f64().ok_or_else(invalid)?;
    Ok(whole + fraction / MUTEZ_PER_TEZ as f64)
}

/// Rounds a display amount to whole minimal units. Negative amounts clamp to zero.
pub fn tez_to_mutez(amount: Amount) -> u64 {
    let mutez = (amount * MUTEZ_PER_TEZ as f64).round();
    if mutez.is_finite() && mutez > 0.0 {
        mutez as u64
    } else {
        0
    }
}
