//! ROSCA membership discovery
//!
//! Finds the contracts a user has joined by scanning for
//! `ParticipantRegistered` events with the user as the indexed participant,
//! from genesis to the latest block, across all contract addresses.
//!
//! Discovery is best-effort: results are a hint for the UI and are always
//! re-derivable from chain logs, so any failure yields an empty list
//! rather than an error.

use alloy::{
    primitives::{keccak256, Address},
    providers::Provider,
    rpc::types::{BlockNumberOrTag, Filter},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::RoscaClient;

/// A ROSCA contract the user has registered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredRosca {
    pub contract_address: Address,
    /// Block in which the registration event was emitted.
    pub block_number: u64,
}

/// Discover the ROSCAs `user` has joined.
///
/// Duplicate registrations against the same contract are collapsed to the
/// first occurrence. Never fails: an unreachable RPC yields an empty list.
pub async fn discover_user_roscas(client: &RoscaClient, user: Address) -> Vec<DiscoveredRosca> {
    let topic = keccak256(b"ParticipantRegistered(address)");

    let filter = Filter::new()
        .event_signature(topic)
        .topic1(user.into_word())
        .from_block(0u64)
        .to_block(BlockNumberOrTag::Latest);

    let logs = match client.provider().get_logs(&filter).await {
        Ok(logs) => logs,
        Err(error) => {
            warn!(user = %user, error = %error, "ROSCA discovery query failed");
            return Vec::new();
        }
    };

    let mut contracts: Vec<DiscoveredRosca> = Vec::new();
    for log in logs {
        let contract_address = log.address();
        if contracts
            .iter()
            .any(|c| c.contract_address == contract_address)
        {
            continue;
        }
        contracts.push(DiscoveredRosca {
            contract_address,
            block_number: log.block_number.unwrap_or_default(),
        });
    }

    debug!(user = %user, count = contracts.len(), "ROSCA discovery complete");
    contracts
}
