//! EVM RPC client wrappers
//!
//! A read-only client for the query surface and a signing client for the
//! write pipeline, built over alloy HTTP providers.

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, U256},
    providers::{
        fillers::{FillProvider, JoinFill, WalletFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    signers::local::PrivateKeySigner,
    transports::http::{Client, Http},
};
use eyre::{eyre, Result};
use tracing::info;

/// Read-only HTTP provider type.
pub type HttpProvider = RootProvider<Http<Client>>;

/// Wallet-filled HTTP provider type used for writes.
#[allow(clippy::type_complexity)]
pub type SignerProvider = FillProvider<
    JoinFill<Identity, WalletFiller<EthereumWallet>>,
    RootProvider<Http<Client>>,
    Http<Client>,
    Ethereum,
>;

/// Read-only client for ROSCA contract queries.
pub struct RoscaClient {
    provider: HttpProvider,
    /// Chain ID the client is configured for
    pub chain_id: u64,
}

impl RoscaClient {
    pub fn new(rpc_url: &str, chain_id: u64) -> Result<Self> {
        let provider = ProviderBuilder::new().on_http(
            rpc_url
                .parse()
                .map_err(|e| eyre!("Invalid RPC URL: {}", e))?,
        );

        info!(rpc_url = %rpc_url, chain_id = chain_id, "Created read-only ROSCA client");

        Ok(Self { provider, chain_id })
    }

    /// Get the underlying provider
    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }

    /// Get the current block number
    pub async fn get_block_number(&self) -> Result<u64> {
        let block = self.provider.get_block_number().await?;
        Ok(block)
    }

    /// Get the ETH balance of an address
    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        let balance = self.provider.get_balance(address).await?;
        Ok(balance)
    }

    /// Get the chain ID from the RPC
    pub async fn get_chain_id(&self) -> Result<u64> {
        let chain_id = self.provider.get_chain_id().await?;
        Ok(chain_id)
    }
}

/// Client with signing capabilities for the write pipeline.
pub struct RoscaSignerClient {
    provider: SignerProvider,
    /// Chain ID the client is configured for
    pub chain_id: u64,
    /// Signer address
    pub signer_address: Address,
}

impl RoscaSignerClient {
    pub fn new(rpc_url: &str, chain_id: u64, private_key: &str) -> Result<Self> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| eyre!("Invalid private key: {}", e))?;

        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let provider = ProviderBuilder::new().wallet(wallet).on_http(
            rpc_url
                .parse()
                .map_err(|e| eyre!("Invalid RPC URL: {}", e))?,
        );

        info!(
            rpc_url = %rpc_url,
            chain_id = chain_id,
            address = %address,
            "Created ROSCA client with signer"
        );

        Ok(Self {
            provider,
            chain_id,
            signer_address: address,
        })
    }

    /// Get the underlying wallet-filled provider
    pub fn provider(&self) -> &SignerProvider {
        &self.provider
    }

    /// Get the signer address
    pub fn signer_address(&self) -> Address {
        self.signer_address
    }

    /// Get the chain ID from the RPC
    pub async fn get_chain_id(&self) -> Result<u64> {
        let chain_id = self.provider.get_chain_id().await?;
        Ok(chain_id)
    }
}
