//! ROSCA query helpers
//!
//! Typed read functions over the contract's view surface, plus the detail
//! aggregator that folds raw reads into a [`RoscaDetails`] snapshot.
//!
//! The single-value readers are the lowest-level primitives: one contract
//! call each, typed decode at the boundary, no retries, errors propagate
//! untouched. The batch fetchers on top of them tolerate per-item failure:
//! unfilled participant slots revert on out-of-range access, which is
//! expected steady-state behavior, not an exceptional condition.

use alloy::{
    primitives::{Address, U256},
    providers::ProviderBuilder,
};
use eyre::{eyre, Result};
use futures::future::join_all;
use tracing::debug;

use crate::client::{HttpProvider, RoscaClient};
use crate::contracts::Rosca;
use crate::types::{
    wei_to_eth, ContributionStatus, Participant, RoscaDetails, RoscaStatus, RoundStatus,
};

/// Read-only query client for ROSCA contracts.
///
/// One client serves any number of contract addresses on its chain.
pub struct RoscaQueryClient {
    provider: HttpProvider,
    /// Chain ID (retained for context)
    #[allow(dead_code)]
    chain_id: u64,
}

impl RoscaQueryClient {
    /// Create a new query client
    pub fn new(rpc_url: &str, chain_id: u64) -> Result<Self> {
        let provider = ProviderBuilder::new().on_http(
            rpc_url
                .parse()
                .map_err(|e| eyre!("Invalid RPC URL: {}", e))?,
        );

        Ok(Self { provider, chain_id })
    }

    /// Create from an existing read-only client
    pub fn from_client(client: &RoscaClient) -> Self {
        Self {
            provider: client.provider().clone(),
            chain_id: client.chain_id,
        }
    }

    // =========================================================================
    // Single-Value Readers
    // =========================================================================

    /// Total pool amount in wei
    pub async fn total_amount(&self, contract: Address) -> Result<U256> {
        let rosca = Rosca::new(contract, &self.provider);
        let result = rosca
            .totalAmount()
            .call()
            .await
            .map_err(|e| eyre!("Failed to get total amount: {}", e))?;

        Ok(result._0)
    }

    /// Per-participant contribution share in wei
    pub async fn contribution_amount(&self, contract: Address) -> Result<U256> {
        let rosca = Rosca::new(contract, &self.provider);
        let result = rosca
            .contributionAmount()
            .call()
            .await
            .map_err(|e| eyre!("Failed to get contribution amount: {}", e))?;

        Ok(result._0)
    }

    /// Participant capacity
    pub async fn total_participants(&self, contract: Address) -> Result<u64> {
        let rosca = Rosca::new(contract, &self.provider);
        let result = rosca
            .totalParticipants()
            .call()
            .await
            .map_err(|e| eyre!("Failed to get total participants: {}", e))?;

        Ok(result._0.try_into().unwrap_or(u64::MAX))
    }

    /// Index of the current round
    pub async fn current_round(&self, contract: Address) -> Result<u64> {
        let rosca = Rosca::new(contract, &self.provider);
        let result = rosca
            .currentRound()
            .call()
            .await
            .map_err(|e| eyre!("Failed to get current round: {}", e))?;

        Ok(result._0.try_into().unwrap_or(u64::MAX))
    }

    /// Participant address at a join-order index. Reverts for unfilled
    /// slots; callers that expect sparse fill go through
    /// [`Self::fetch_participants`] instead.
    pub async fn participant_at(&self, contract: Address, index: u64) -> Result<Address> {
        let rosca = Rosca::new(contract, &self.provider);
        let result = rosca
            .participantList(U256::from(index))
            .call()
            .await
            .map_err(|e| eyre!("Failed to get participant at index {}: {}", index, e))?;

        Ok(result._0)
    }

    /// Whether an address has contributed this round
    pub async fn has_contributed(&self, contract: Address, participant: Address) -> Result<bool> {
        let rosca = Rosca::new(contract, &self.provider);
        let result = rosca
            .hasContributed(participant)
            .call()
            .await
            .map_err(|e| eyre!("Failed to check contribution for {}: {}", participant, e))?;

        Ok(result._0)
    }

    /// Snapshot of the current round
    pub async fn round_status(&self, contract: Address) -> Result<RoundStatus> {
        let rosca = Rosca::new(contract, &self.provider);
        let result = rosca
            .getCurrentRoundStatus()
            .call()
            .await
            .map_err(|e| eyre!("Failed to get round status: {}", e))?;

        Ok(RoundStatus {
            round_number: result.roundNumber.try_into().unwrap_or(u64::MAX),
            recipient: result.recipient,
            total_contributed: result.totalContributed,
            target_amount: result.targetAmount,
            is_distributed: result.isDistributed,
        })
    }

    /// Distributed flag of the round at `index`
    pub async fn round_distributed(&self, contract: Address, index: u64) -> Result<bool> {
        let rosca = Rosca::new(contract, &self.provider);
        let result = rosca
            .rounds(U256::from(index))
            .call()
            .await
            .map_err(|e| eyre!("Failed to get round {}: {}", index, e))?;

        Ok(result.isDistributed)
    }

    // =========================================================================
    // Batch Fetchers
    // =========================================================================

    /// Enumerate `participantList[0..total_participants)`.
    ///
    /// Slot reads run concurrently, bounded by the capacity. Per-index
    /// failures drop the index; zero addresses are filtered out. Join
    /// order is preserved. Never fails: total failure yields an empty
    /// list.
    pub async fn fetch_participants(
        &self,
        contract: Address,
        total_participants: u64,
    ) -> Vec<Address> {
        let reads = (0..total_participants).map(|index| async move {
            match self.participant_at(contract, index).await {
                Ok(address) => Some(address),
                Err(error) => {
                    debug!(index, %error, "Skipping participant slot");
                    None
                }
            }
        });

        filter_valid_addresses(join_all(reads).await)
    }

    /// Fetch `hasContributed` for each address.
    ///
    /// A per-address failure means "unknown, treat as not yet paid" and
    /// defaults that entry to `false`. The result is parallel to the
    /// input order.
    pub async fn fetch_contribution_flags(
        &self,
        contract: Address,
        addresses: &[Address],
    ) -> Vec<bool> {
        let reads = addresses.iter().map(|address| async move {
            match self.has_contributed(contract, *address).await {
                Ok(paid) => paid,
                Err(error) => {
                    debug!(%address, %error, "Contribution flag unreadable, treating as pending");
                    false
                }
            }
        });

        join_all(reads).await
    }

    /// Enumerate participants and their per-round contribution state.
    pub async fn fetch_round_participants(
        &self,
        contract: Address,
        total_participants: u64,
    ) -> Vec<Participant> {
        let addresses = self.fetch_participants(contract, total_participants).await;
        let flags = self.fetch_contribution_flags(contract, &addresses).await;
        assemble_participants(addresses, &flags)
    }

    // =========================================================================
    // Detail Aggregator
    // =========================================================================

    /// Compose a full [`RoscaDetails`] snapshot for a contract.
    ///
    /// The three independent amount/capacity reads are issued together and
    /// joined; participant enumeration follows; the current round snapshot
    /// is read defensively (an unreadable round counts as not
    /// distributed); finally the last round slot is probed for the
    /// distributed flag that marks full completion, failing open toward
    /// "not yet completed".
    pub async fn fetch_rosca_details(&self, contract: Address) -> Result<RoscaDetails> {
        let (total_amount, contribution_amount, capacity) = tokio::join!(
            self.total_amount(contract),
            self.contribution_amount(contract),
            self.total_participants(contract),
        );
        let total_amount = total_amount?;
        let contribution_amount = contribution_amount?;
        let capacity = capacity?;

        let participants = self.fetch_participants(contract, capacity).await;

        let round = self.round_status(contract).await.ok();
        let round_distributed = round.map(|r| r.is_distributed).unwrap_or(false);

        let completed = if capacity > 0 {
            match self.round_distributed(contract, capacity - 1).await {
                Ok(distributed) => distributed,
                Err(error) => {
                    debug!(%contract, %error, "Final round probe failed, assuming not completed");
                    false
                }
            }
        } else {
            false
        };

        let joined = participants.len() as u64;
        let status = RoscaStatus::derive(capacity, joined, round_distributed, completed);

        Ok(RoscaDetails {
            total_amount: wei_to_eth(total_amount),
            contribution_amount: wei_to_eth(contribution_amount),
            participants: capacity,
            current_participants: joined,
            status,
        })
    }
}

/// Drop failed slots and zero addresses, preserving index order.
fn filter_valid_addresses(raw: Vec<Option<Address>>) -> Vec<Address> {
    raw.into_iter()
        .flatten()
        .filter(|address| *address != Address::ZERO)
        .collect()
}

/// Pair addresses with their contribution flags, assigning 1-based turns
/// in join order. A missing flag reads as pending.
fn assemble_participants(addresses: Vec<Address>, flags: &[bool]) -> Vec<Participant> {
    addresses
        .into_iter()
        .enumerate()
        .map(|(i, address)| Participant {
            address,
            status: if flags.get(i).copied().unwrap_or(false) {
                ContributionStatus::Paid
            } else {
                ContributionStatus::Pending
            },
            turn: (i + 1) as u64,
        })
        .collect()
}
