//! Common types for ROSCA contract state
//!
//! Everything here is a plain snapshot: produced fresh from chain reads,
//! owned by the caller, never mutated in place.

use alloy::primitives::{
    utils::{format_ether, parse_ether},
    Address, U256,
};
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a ROSCA, precedence-ordered.
///
/// `Completed` (final round distributed) overrides `Distributed` (current
/// round distributed, more rounds remain) overrides `Full` (all slots
/// filled) overrides the default `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoscaStatus {
    Active,
    Full,
    Distributed,
    Completed,
}

impl RoscaStatus {
    /// Fold raw chain observations into a single status.
    ///
    /// Exactly one value holds even when several conditions are true at
    /// once; the client only observes status, it never advances it.
    pub fn derive(
        capacity: u64,
        joined: u64,
        round_distributed: bool,
        final_round_distributed: bool,
    ) -> Self {
        if final_round_distributed {
            RoscaStatus::Completed
        } else if round_distributed {
            RoscaStatus::Distributed
        } else if capacity > 0 && joined >= capacity {
            RoscaStatus::Full
        } else {
            RoscaStatus::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoscaStatus::Active => "Active",
            RoscaStatus::Full => "Full",
            RoscaStatus::Distributed => "Distributed",
            RoscaStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for RoscaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the contract's current round.
///
/// Decoded from the `getCurrentRoundStatus()` tuple at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundStatus {
    pub round_number: u64,
    pub recipient: Address,
    /// Total contributed this round, in wei.
    pub total_contributed: U256,
    /// Per-round target, in wei.
    pub target_amount: U256,
    pub is_distributed: bool,
}

/// Per-round contribution state of one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionStatus {
    Paid,
    Pending,
}

/// A joined participant. `turn` is the 1-based position in join order,
/// which is also the payout order. Paid/pending is per-round and is
/// recomputed on every fetch, never carried across rounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub address: Address,
    pub status: ContributionStatus,
    pub turn: u64,
}

impl Participant {
    pub fn is_paid(&self) -> bool {
        self.status == ContributionStatus::Paid
    }
}

/// Aggregated view of one ROSCA, recomputed on demand.
///
/// Amounts are human-scale ETH values for display; the wei originals stay
/// behind the query boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct RoscaDetails {
    pub total_amount: f64,
    pub contribution_amount: f64,
    /// Participant capacity.
    pub participants: u64,
    /// Joined so far.
    pub current_participants: u64,
    pub status: RoscaStatus,
}

/// Convert an on-chain wei amount to a display ETH value.
///
/// One-directional: display math only, never fed back into a transaction.
pub fn wei_to_eth(wei: U256) -> f64 {
    format_ether(wei).parse().unwrap_or(0.0)
}

/// Convert an ETH amount to wei with floor semantics.
///
/// The amount is truncated to 18 decimal places before scaling so that no
/// fractional wei is ever produced.
pub fn eth_to_wei(eth: f64) -> Result<U256> {
    if !eth.is_finite() || eth < 0.0 {
        return Err(eyre!("ETH amount must be a non-negative number, got {eth}"));
    }
    parse_ether(&format!("{eth:.18}")).map_err(|e| eyre!("Invalid ETH amount {eth}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_precedence() {
        // Default
        assert_eq!(RoscaStatus::derive(5, 3, false, false), RoscaStatus::Active);
        // Full once every slot is taken
        assert_eq!(RoscaStatus::derive(5, 5, false, false), RoscaStatus::Full);
        // Distributed beats Full
        assert_eq!(
            RoscaStatus::derive(5, 5, true, false),
            RoscaStatus::Distributed
        );
        // Completed beats everything
        assert_eq!(
            RoscaStatus::derive(5, 5, true, true),
            RoscaStatus::Completed
        );
        assert_eq!(
            RoscaStatus::derive(5, 3, false, true),
            RoscaStatus::Completed
        );
    }

    #[test]
    fn test_status_empty_rosca() {
        // Zero capacity never reads as Full
        assert_eq!(RoscaStatus::derive(0, 0, false, false), RoscaStatus::Active);
    }

    #[test]
    fn test_wei_to_eth() {
        let one_eth = U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(wei_to_eth(one_eth), 1.0);
        assert_eq!(wei_to_eth(one_eth / U256::from(2u64)), 0.5);
        assert_eq!(wei_to_eth(U256::ZERO), 0.0);
    }

    #[test]
    fn test_eth_to_wei_floor() {
        let one_eth = U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(eth_to_wei(1.0).unwrap(), one_eth);
        assert_eq!(eth_to_wei(0.5).unwrap(), one_eth / U256::from(2u64));
        assert_eq!(eth_to_wei(0.0).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_eth_to_wei_rejects_negative() {
        assert!(eth_to_wei(-1.0).is_err());
        assert!(eth_to_wei(f64::NAN).is_err());
    }

    #[test]
    fn test_roundtrip_display_value() {
        let wei = eth_to_wei(2.25).unwrap();
        assert_eq!(wei_to_eth(wei), 2.25);
    }
}
