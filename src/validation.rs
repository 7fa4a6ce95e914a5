//! Local input validation
//!
//! Checks that run before any chain call. Failures are constructed
//! directly as `Validation` errors with precise messages; they never go
//! through the categorizer's pattern matching.

use alloy::primitives::Address;
use std::str::FromStr;

use crate::error::RoscaError;

/// Amounts at or above this many ETH are treated as high-value and should
/// get an extra confirmation step in the UI.
pub const HIGH_VALUE_THRESHOLD_ETH: f64 = 0.1;

/// Validate and parse an Ethereum address string.
///
/// Rejects missing/short input, non-hex content, and the zero address.
pub fn validate_address(address: &str) -> Result<Address, RoscaError> {
    if address.is_empty() {
        return Err(RoscaError::validation("Address is required"));
    }
    if !address.starts_with("0x") {
        return Err(RoscaError::validation("Address must start with 0x"));
    }
    if address.len() != 42 {
        return Err(RoscaError::validation("Address must be 42 characters long"));
    }

    let parsed = Address::from_str(address)
        .map_err(|_| RoscaError::validation("Invalid Ethereum address format"))?;

    if parsed == Address::ZERO {
        return Err(RoscaError::validation("Zero address is not allowed"));
    }

    Ok(parsed)
}

/// Validate a numeric amount against range and precision limits.
pub fn validate_amount(
    value: f64,
    min: f64,
    max: f64,
    max_decimals: u32,
) -> Result<(), RoscaError> {
    if !value.is_finite() {
        return Err(RoscaError::validation("Must be a valid number"));
    }
    if value < min {
        return Err(RoscaError::validation(format!("Must be at least {min}")));
    }
    if value > max {
        return Err(RoscaError::validation(format!("Must be at most {max}")));
    }

    // More decimal places than the contract can represent would silently
    // lose fractional wei.
    let text = format!("{value}");
    let decimals = text.split('.').nth(1).map(str::len).unwrap_or(0);
    if decimals as u32 > max_decimals {
        return Err(RoscaError::validation(format!(
            "Maximum {max_decimals} decimal places allowed"
        )));
    }

    Ok(())
}

/// Check that the connected network is the expected one.
pub fn validate_network(chain_id: Option<u64>, expected_chain_id: u64) -> Result<(), RoscaError> {
    match chain_id {
        None => Err(RoscaError::validation(
            "No network detected. Please connect your wallet.",
        )),
        Some(id) if id != expected_chain_id => Err(RoscaError::validation(format!(
            "Wrong network. Please switch to the correct network (Chain ID: {expected_chain_id})"
        ))),
        Some(_) => Ok(()),
    }
}

/// Whether an amount should trigger the high-value confirmation flow.
pub fn is_high_value(amount_eth: f64, threshold_eth: f64) -> bool {
    amount_eth >= threshold_eth
}
