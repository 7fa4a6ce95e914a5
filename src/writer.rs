//! Transaction write pipeline
//!
//! Every state-changing call goes through simulate-and-send: the call is
//! dry-run against current chain state first, and nothing is ever
//! broadcast after a failed simulation. A failed simulation resolves to a
//! decoded revert reason; a failed broadcast resolves to the categorizer's
//! user-facing message.
//!
//! The [`TxDispatcher`] seam separates the pipeline's control flow from
//! the alloy plumbing so tests can count broadcast attempts.

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, B256, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
    sol_types::SolValue,
};
use async_trait::async_trait;
use eyre::{eyre, Result};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::client::RoscaSignerClient;
use crate::contracts::Rosca;
use crate::error::{categorize_error, RoscaError};
use crate::types::eth_to_wei;

/// Payable write functions on the ROSCA contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCall {
    RegisterParticipant,
    Contribute,
    DistributePool,
}

impl WriteCall {
    pub fn name(&self) -> &'static str {
        match self {
            WriteCall::RegisterParticipant => "registerParticipant",
            WriteCall::Contribute => "contribute",
            WriteCall::DistributePool => "distributePool",
        }
    }
}

/// A write about to enter the pipeline.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub contract: Address,
    pub call: WriteCall,
    /// Value transferred with the call, in wei.
    pub value: U256,
}

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    /// Simulation passed and the transaction was broadcast.
    Sent { tx_hash: B256 },
    /// Simulation or broadcast failed; `reason` is safe to display.
    Rejected { reason: String },
}

impl TxOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, TxOutcome::Sent { .. })
    }
}

/// Simulation failure carrying the structured RPC error payload, so the
/// revert reason can be dug out of whichever nesting the error channel
/// used.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SimulationFailure {
    pub message: String,
    pub payload: Value,
}

/// Dry-run and broadcast backend for the pipeline.
#[async_trait]
pub trait TxDispatcher: Send + Sync {
    /// Dry-run the call against current chain state without broadcasting.
    async fn simulate(&self, request: &WriteRequest) -> Result<()>;

    /// Broadcast the transaction and return its hash.
    async fn broadcast(&self, request: &WriteRequest) -> Result<B256>;
}

/// Run the pipeline: simulate, then send.
///
/// `Idle → Simulating → (SimFailed | Simulated) → Sending →
/// (SendFailed | Sent)`; `SimFailed` terminates with zero broadcasts.
pub async fn simulate_and_send<D: TxDispatcher + ?Sized>(
    dispatcher: &D,
    request: &WriteRequest,
) -> TxOutcome {
    if let Err(error) = dispatcher.simulate(request).await {
        let reason = revert_reason(&error);
        warn!(
            function = request.call.name(),
            contract = %request.contract,
            reason = %reason,
            "Simulation failed, transaction not broadcast"
        );
        return TxOutcome::Rejected { reason };
    }

    match dispatcher.broadcast(request).await {
        Ok(tx_hash) => {
            info!(
                function = request.call.name(),
                contract = %request.contract,
                tx_hash = %tx_hash,
                "Transaction sent"
            );
            TxOutcome::Sent { tx_hash }
        }
        Err(error) => {
            let enhanced = categorize_error(&error);
            warn!(
                function = request.call.name(),
                contract = %request.contract,
                category = %enhanced.category,
                error = %enhanced.message,
                "Broadcast failed"
            );
            TxOutcome::Rejected {
                reason: enhanced.user_friendly,
            }
        }
    }
}

// ============================================================================
// Revert-Reason Extraction
// ============================================================================

const REVERT_REASON_PREFIX: &str = "reverted with reason string '";

/// Extract a human revert reason from a structured RPC error payload.
///
/// Channels are searched in a fixed priority order, first match wins:
/// `cause.reason`, then `data.message` and `data.error.message` against
/// the reason-string pattern, then the top-level `message`. The order
/// matters because client-side simulation and node RPC surface revert
/// strings at different nesting depths.
pub fn extract_revert_reason(payload: &Value) -> Option<String> {
    if let Some(reason) = payload.pointer("/cause/reason").and_then(Value::as_str) {
        return Some(reason.to_string());
    }

    for path in ["/data/message", "/data/error/message", "/message"] {
        if let Some(reason) = payload
            .pointer(path)
            .and_then(Value::as_str)
            .and_then(reason_from_text)
        {
            return Some(reason);
        }
    }

    None
}

/// Pull the quoted reason out of a `reverted with reason string '...'`
/// message.
fn reason_from_text(text: &str) -> Option<String> {
    let start = text.find(REVERT_REASON_PREFIX)? + REVERT_REASON_PREFIX.len();
    let rest = &text[start..];
    let end = rest.find('\'')?;
    Some(rest[..end].to_string())
}

/// Resolve a pipeline error to a displayable reason, falling back to the
/// raw message and finally to a generic failure line.
pub fn revert_reason(error: &eyre::Report) -> String {
    if let Some(sim) = error.downcast_ref::<SimulationFailure>() {
        if let Some(reason) = extract_revert_reason(&sim.payload) {
            return reason;
        }
        if !sim.message.is_empty() {
            return sim.message.clone();
        }
    } else {
        let text = error.to_string();
        if let Some(reason) = reason_from_text(&text) {
            return reason;
        }
        if !text.is_empty() {
            return text;
        }
    }

    "Transaction failed.".to_string()
}

// ============================================================================
// Production Dispatcher
// ============================================================================

/// Dispatcher backed by a signing client and the sol! bindings.
pub struct SignerDispatcher<'a> {
    client: &'a RoscaSignerClient,
}

impl<'a> SignerDispatcher<'a> {
    pub fn new(client: &'a RoscaSignerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TxDispatcher for SignerDispatcher<'_> {
    async fn simulate(&self, request: &WriteRequest) -> Result<()> {
        let rosca = Rosca::new(request.contract, self.client.provider());

        let result = match request.call {
            WriteCall::RegisterParticipant => rosca
                .registerParticipant()
                .value(request.value)
                .call()
                .await
                .map(|_| ()),
            WriteCall::Contribute => rosca
                .contribute()
                .value(request.value)
                .call()
                .await
                .map(|_| ()),
            WriteCall::DistributePool => rosca
                .distributePool()
                .value(request.value)
                .call()
                .await
                .map(|_| ()),
        };

        result.map_err(|error| {
            let payload = rpc_error_payload(&error);
            eyre::Report::new(SimulationFailure {
                message: error.to_string(),
                payload,
            })
        })
    }

    async fn broadcast(&self, request: &WriteRequest) -> Result<B256> {
        let rosca = Rosca::new(request.contract, self.client.provider());

        let pending = match request.call {
            WriteCall::RegisterParticipant => {
                rosca
                    .registerParticipant()
                    .value(request.value)
                    .send()
                    .await
            }
            WriteCall::Contribute => rosca.contribute().value(request.value).send().await,
            WriteCall::DistributePool => rosca.distributePool().value(request.value).send().await,
        }
        .map_err(|e| eyre!("Failed to send transaction: {}", e))?;

        Ok(*pending.tx_hash())
    }
}

/// Recover the structured JSON-RPC error payload from an alloy contract
/// error, keeping whatever nesting the node produced.
fn rpc_error_payload(error: &alloy::contract::Error) -> Value {
    if let alloy::contract::Error::TransportError(transport) = error {
        if let Some(resp) = transport.as_error_resp() {
            let data = resp
                .data
                .as_ref()
                .and_then(|raw| serde_json::from_str::<Value>(raw.get()).ok());
            return json!({ "message": resp.message.clone(), "data": data });
        }
    }
    json!({ "message": error.to_string() })
}

// ============================================================================
// High-Level Operations
// ============================================================================

/// Write operations over one signing client.
pub struct RoscaWriter<'a> {
    client: &'a RoscaSignerClient,
}

impl<'a> RoscaWriter<'a> {
    pub fn new(client: &'a RoscaSignerClient) -> Self {
        Self { client }
    }

    /// Join a ROSCA by calling `registerParticipant` with one contribution
    /// share attached.
    pub async fn join_rosca(&self, contract: Address, contribution_eth: f64) -> Result<TxOutcome> {
        let value = eth_to_wei(contribution_eth)?;
        let request = WriteRequest {
            contract,
            call: WriteCall::RegisterParticipant,
            value,
        };
        Ok(simulate_and_send(&SignerDispatcher::new(self.client), &request).await)
    }

    /// Pay this round's contribution share.
    pub async fn contribute(&self, contract: Address, contribution_eth: f64) -> Result<TxOutcome> {
        let value = eth_to_wei(contribution_eth)?;
        let request = WriteRequest {
            contract,
            call: WriteCall::Contribute,
            value,
        };
        Ok(simulate_and_send(&SignerDispatcher::new(self.client), &request).await)
    }

    /// Claim the round's pool for its recipient.
    pub async fn claim_distribution(&self, contract: Address) -> Result<TxOutcome> {
        let request = WriteRequest {
            contract,
            call: WriteCall::DistributePool,
            value: U256::ZERO,
        };
        Ok(simulate_and_send(&SignerDispatcher::new(self.client), &request).await)
    }
}

// ============================================================================
// Deployment
// ============================================================================

/// Parameters for deploying a new ROSCA instance.
#[derive(Debug, Clone)]
pub struct DeployParams {
    pub number_of_participants: u64,
    /// Total pool amount in ETH.
    pub total_amount_eth: f64,
}

/// Deploy a new ROSCA contract.
///
/// Constructor args are `(numberOfParticipants, totalAmountWei)`; the
/// deployer's first contribution share is attached as the transaction
/// value. Waits for the receipt and returns the deployed address.
pub async fn deploy_rosca(
    client: &RoscaSignerClient,
    bytecode: &Bytes,
    params: &DeployParams,
) -> Result<Address> {
    if params.number_of_participants == 0 {
        return Err(RoscaError::validation("Number of participants must be at least 1").into());
    }

    let total_wei = eth_to_wei(params.total_amount_eth)?;
    let share_eth = params.total_amount_eth / params.number_of_participants as f64;
    let value = eth_to_wei(share_eth)?;

    let constructor_args =
        (U256::from(params.number_of_participants), total_wei).abi_encode_params();
    let mut deploy_code = bytecode.to_vec();
    deploy_code.extend_from_slice(&constructor_args);

    debug!(
        participants = params.number_of_participants,
        total_eth = params.total_amount_eth,
        share_eth,
        "Deploying ROSCA contract"
    );

    let tx = TransactionRequest::default()
        .with_deploy_code(deploy_code)
        .with_value(value);

    let pending = client
        .provider()
        .send_transaction(tx)
        .await
        .map_err(|e| eyre!("Failed to send deployment transaction: {}", e))?;

    let tx_hash = *pending.tx_hash();
    info!(tx_hash = %tx_hash, "Deployment transaction sent, waiting for receipt");

    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| eyre!("Failed to get deployment receipt: {}", e))?;

    let address = receipt
        .contract_address
        .ok_or_else(|| eyre!("Deployment receipt has no contract address"))?;

    info!(contract = %address, "ROSCA contract deployed");
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_reason_from_data_message() {
        let payload = json!({
            "data": {
                "message": "execution reverted: reverted with reason string 'Not enough participants'"
            }
        });
        assert_eq!(
            extract_revert_reason(&payload),
            Some("Not enough participants".to_string())
        );
    }

    #[test]
    fn test_cause_reason_takes_priority() {
        let payload = json!({
            "cause": { "reason": "Already registered" },
            "message": "reverted with reason string 'something else'"
        });
        assert_eq!(
            extract_revert_reason(&payload),
            Some("Already registered".to_string())
        );
    }

    #[test]
    fn test_nested_error_message_channel() {
        let payload = json!({
            "data": {
                "error": {
                    "message": "reverted with reason string 'Round already distributed'"
                }
            }
        });
        assert_eq!(
            extract_revert_reason(&payload),
            Some("Round already distributed".to_string())
        );
    }

    #[test]
    fn test_top_level_message_channel() {
        let payload = json!({
            "message": "reverted with reason string 'Contribution amount incorrect'"
        });
        assert_eq!(
            extract_revert_reason(&payload),
            Some("Contribution amount incorrect".to_string())
        );
    }

    #[test]
    fn test_no_reason_found() {
        let payload = json!({ "message": "nonce too low" });
        assert_eq!(extract_revert_reason(&payload), None);
    }

    #[test]
    fn test_revert_reason_falls_back_to_raw_message() {
        let error = eyre!("gateway unavailable");
        assert_eq!(revert_reason(&error), "gateway unavailable");
    }

    #[test]
    fn test_revert_reason_generic_fallback() {
        let error = eyre::Report::new(SimulationFailure {
            message: String::new(),
            payload: json!({}),
        });
        assert_eq!(revert_reason(&error), "Transaction failed.");
    }

    #[test]
    fn test_write_call_names() {
        assert_eq!(WriteCall::RegisterParticipant.name(), "registerParticipant");
        assert_eq!(WriteCall::Contribute.name(), "contribute");
        assert_eq!(WriteCall::DistributePool.name(), "distributePool");
    }
}
