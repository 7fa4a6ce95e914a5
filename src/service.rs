//! High-level ROSCA operations
//!
//! Composes the query, write, discovery, caching, retry, and rate-limit
//! pieces into the operations a UI layer actually calls. Holds no state
//! of its own beyond the rate limiter windows and the discovery cache.

use alloy::primitives::{Address, Bytes};
use eyre::{eyre, Result};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::client::{RoscaClient, RoscaSignerClient};
use crate::config::Config;
use crate::discovery::{discover_user_roscas, DiscoveredRosca};
use crate::error::RoscaError;
use crate::queries::RoscaQueryClient;
use crate::rate_limit::ClientRateLimiter;
use crate::retry::{retry_operation, RetryPolicy};
use crate::status_note::{derive_status_note, RoundView};
use crate::store::DiscoveryCache;
use crate::types::{Participant, RoscaDetails, RoundStatus};
use crate::validation::validate_network;
use crate::writer::{deploy_rosca, DeployParams, RoscaWriter, TxOutcome};

/// Rate-limiter keys for the logical operations.
const KEY_SEARCH: &str = "search";
const KEY_DEPLOYMENT: &str = "deployment";
const KEY_TRANSACTION: &str = "transaction";

/// One discovered membership with its aggregated details.
#[derive(Debug, Clone)]
pub struct Membership {
    pub contract: DiscoveredRosca,
    pub details: RoscaDetails,
}

/// Everything the dashboard shows for one round.
#[derive(Debug, Clone)]
pub struct RoundOverview {
    pub participants: Vec<Participant>,
    pub round: Option<RoundStatus>,
    /// Human-readable phase-of-round line.
    pub note: String,
}

/// High-level client service wired from a [`Config`].
pub struct RoscaService {
    client: RoscaClient,
    queries: RoscaQueryClient,
    signer: Option<RoscaSignerClient>,
    cache: DiscoveryCache,
    search_limiter: ClientRateLimiter,
    deployment_limiter: ClientRateLimiter,
    transaction_limiter: ClientRateLimiter,
    retry: RetryPolicy,
    expected_chain_id: u64,
}

impl RoscaService {
    pub fn new(config: &Config) -> Result<Self> {
        let client = RoscaClient::new(&config.rpc_url, config.chain_id)?;
        let queries = RoscaQueryClient::from_client(&client);

        let signer = match &config.private_key {
            Some(key) => Some(RoscaSignerClient::new(&config.rpc_url, config.chain_id, key)?),
            None => None,
        };

        Ok(Self {
            client,
            queries,
            signer,
            cache: DiscoveryCache::new(config.cache_dir.clone()),
            search_limiter: ClientRateLimiter::new(config.rate_limits.search),
            deployment_limiter: ClientRateLimiter::new(config.rate_limits.deployment),
            transaction_limiter: ClientRateLimiter::new(config.rate_limits.transaction),
            retry: RetryPolicy::default(),
            expected_chain_id: config.chain_id,
        })
    }

    /// Access the query layer directly.
    pub fn queries(&self) -> &RoscaQueryClient {
        &self.queries
    }

    // =========================================================================
    // Membership Lookup
    // =========================================================================

    /// List the ROSCAs `user` has joined, with aggregated details.
    ///
    /// With `use_cache`, a fresh cache entry short-circuits the chain log
    /// scan. Contracts whose detail fetch keeps failing are dropped from
    /// the result rather than failing the whole lookup.
    pub async fn my_roscas(&self, user: Address, use_cache: bool) -> Result<Vec<Membership>> {
        if !self.search_limiter.can_make_request(KEY_SEARCH) {
            let wait = self.search_limiter.get_remaining_time(KEY_SEARCH);
            return Err(RoscaError::rate_limited(format!(
                "Too many searches, retry in {}s",
                wait.as_secs().max(1)
            ))
            .into());
        }

        let cached = if use_cache {
            self.cache.get_cached(user)
        } else {
            None
        };

        let contracts = match cached {
            Some(contracts) => {
                debug!(user = %user, count = contracts.len(), "Using cached discovery");
                contracts
            }
            None => {
                let discovered = discover_user_roscas(&self.client, user).await;
                if let Err(error) = self.cache.cache(user, &discovered) {
                    warn!(user = %user, %error, "Failed to write discovery cache");
                }
                discovered
            }
        };

        let lookups = contracts.into_iter().map(|contract| {
            let queries = &self.queries;
            let retry = &self.retry;
            async move {
                let address = contract.contract_address;
                match retry_operation(retry, || queries.fetch_rosca_details(address)).await {
                    Ok(details) => Some(Membership { contract, details }),
                    Err(error) => {
                        warn!(contract = %address, %error, "Dropping ROSCA with unreadable details");
                        None
                    }
                }
            }
        });

        Ok(join_all(lookups).await.into_iter().flatten().collect())
    }

    // =========================================================================
    // Round Overview
    // =========================================================================

    /// Fetch the dashboard view of one ROSCA's current round as seen by
    /// `user`. Degrades instead of failing: unreadable capacity reads as
    /// "still loading", an unreadable round as "not distributed".
    pub async fn round_overview(&self, contract: Address, user: Option<Address>) -> RoundOverview {
        let total_participants = self.queries.total_participants(contract).await.ok();

        let participants = match total_participants {
            Some(capacity) => {
                self.queries
                    .fetch_round_participants(contract, capacity)
                    .await
            }
            None => Vec::new(),
        };

        let round = self.queries.round_status(contract).await.ok();

        let note = derive_status_note(&RoundView {
            participants: &participants,
            total_participants,
            is_distributed: round.as_ref().map(|r| r.is_distributed).unwrap_or(false),
            recipient: round.as_ref().map(|r| r.recipient),
            user,
        });

        RoundOverview {
            participants,
            round,
            note,
        }
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Join a ROSCA, paying one contribution share.
    pub async fn join_rosca(&self, contract: Address, contribution_eth: f64) -> Result<TxOutcome> {
        let signer = self.admit_transaction().await?;
        RoscaWriter::new(signer)
            .join_rosca(contract, contribution_eth)
            .await
    }

    /// Pay this round's contribution share.
    pub async fn contribute(&self, contract: Address, contribution_eth: f64) -> Result<TxOutcome> {
        let signer = self.admit_transaction().await?;
        RoscaWriter::new(signer)
            .contribute(contract, contribution_eth)
            .await
    }

    /// Claim the round's pool for its recipient.
    pub async fn claim_distribution(&self, contract: Address) -> Result<TxOutcome> {
        let signer = self.admit_transaction().await?;
        RoscaWriter::new(signer).claim_distribution(contract).await
    }

    /// Deploy a new ROSCA instance from its compiled bytecode.
    pub async fn deploy(&self, bytecode: &Bytes, params: &DeployParams) -> Result<Address> {
        if !self.deployment_limiter.can_make_request(KEY_DEPLOYMENT) {
            return Err(RoscaError::rate_limited("Too many deployments, slow down").into());
        }
        let signer = self.require_signer()?;
        self.check_network().await?;
        deploy_rosca(signer, bytecode, params).await
    }

    /// Admission checks shared by all transaction writes: rate limit,
    /// signer presence, connected network.
    async fn admit_transaction(&self) -> Result<&RoscaSignerClient> {
        if !self.transaction_limiter.can_make_request(KEY_TRANSACTION) {
            let wait = self.transaction_limiter.get_remaining_time(KEY_TRANSACTION);
            return Err(RoscaError::rate_limited(format!(
                "Too many transactions, retry in {}s",
                wait.as_secs().max(1)
            ))
            .into());
        }
        let signer = self.require_signer()?;
        self.check_network().await?;
        Ok(signer)
    }

    fn require_signer(&self) -> Result<&RoscaSignerClient> {
        self.signer
            .as_ref()
            .ok_or_else(|| eyre!("Wallet not connected: no signing key configured"))
    }

    async fn check_network(&self) -> Result<()> {
        let actual = self.client.get_chain_id().await.ok();
        validate_network(actual, self.expected_chain_id)?;
        Ok(())
    }
}
