//! rosca-client: Client Core for ROSCA Contracts on EVM Chains
//!
//! This crate is the chain-facing core of a ROSCA (rotating savings and
//! credit association) web client. It deploys instances, joins them,
//! contributes, claims distributions, and reconciles raw on-chain state
//! into a consistent user-facing model. Presentation is someone else's
//! job: everything here is plain async functions over plain types.
//!
//! - **Queries** - typed single-value readers, failure-tolerant batch
//!   fetchers, and the detail aggregator that derives lifecycle status
//! - **Writer** - the simulate-and-send transaction pipeline with revert
//!   reason decoding; nothing is broadcast after a failed simulation
//! - **Errors / Retry** - an ordered error taxonomy driving
//!   exponential-backoff retries
//! - **Status Note** - a pure narrator for the round's state machine
//! - **Discovery / Store** - membership discovery from event logs with a
//!   time-boxed local cache
//! - **Rate Limit** - client-side sliding-window admission control
//!
//! ## Usage
//!
//! ```ignore
//! let config = rosca_client::Config::load()?;
//! let queries = rosca_client::RoscaQueryClient::new(&config.rpc_url, config.chain_id)?;
//! let details = queries.fetch_rosca_details(contract).await?;
//! ```

pub mod client;
pub mod config;
pub mod contracts;
pub mod discovery;
pub mod error;
pub mod queries;
pub mod rate_limit;
pub mod retry;
pub mod service;
pub mod status_note;
pub mod store;
pub mod types;
pub mod validation;
pub mod writer;

// Re-export commonly used items at the crate root
pub use client::{RoscaClient, RoscaSignerClient};
pub use config::Config;
pub use discovery::{discover_user_roscas, DiscoveredRosca};
pub use error::{categorize_error, EnhancedError, ErrorCategory, RoscaError};
pub use queries::RoscaQueryClient;
pub use rate_limit::{ClientRateLimiter, RateLimitConfig};
pub use retry::{retry_operation, RetryPolicy};
pub use service::{Membership, RoscaService, RoundOverview};
pub use status_note::{derive_status_note, RoundView};
pub use store::DiscoveryCache;
pub use types::{
    eth_to_wei, wei_to_eth, ContributionStatus, Participant, RoscaDetails, RoscaStatus,
    RoundStatus,
};
pub use writer::{
    deploy_rosca, simulate_and_send, DeployParams, RoscaWriter, TxDispatcher, TxOutcome,
    WriteCall, WriteRequest,
};
