//! Top-level wallet: an HD seed plus an RPC endpoint, with per-contract
//! ERC-20 clients cached by checksum address so repeated lookups for
//! the same token don't re-derive a client each time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use usdcwallet_core::{Account, HdWallet};
use usdcwallet_types::{Address, Error};

use crate::erc20::Erc20Client;
use crate::rpc::RpcClient;
use crate::usdc::UsdcClient;

/// Ties an [`HdWallet`] to a single [`RpcClient`] endpoint.
pub struct Wallet {
    hd: HdWallet,
    rpc: RpcClient,
    erc20_cache: Mutex<HashMap<String, Arc<OnceLock<u8>>>>,
}

impl Wallet {
    /// Builds a wallet from a mnemonic phrase and an RPC endpoint URL.
    pub fn new(phrase: &str, passphrase: &str, rpc_url: impl Into<String>) -> Result<Self, Error> {
        Ok(Self {
            hd: HdWallet::from_mnemonic(phrase, passphrase)?,
            rpc: RpcClient::new(rpc_url),
            erc20_cache: Mutex::new(HashMap::new()),
        })
    }

    /// The account at the default Ethereum path for `account_index`.
    pub fn account(&self, account_index: u32) -> Result<Account, Error> {
        self.hd.select_account(account_index)
    }

    /// The bound RPC client.
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// An ERC-20 client bound to `contract` on this wallet's endpoint.
    ///
    /// Clients are memoized by checksum address: every client returned
    /// for the same contract shares one `decimals` cache cell, so a
    /// value fetched through one call site is visible to the next.
    pub fn erc20(&self, contract: Address) -> Erc20Client<'_> {
        let cache = self
            .erc20_cache
            .lock()
            .expect("cache mutex poisoned")
            .entry(contract.to_string())
            .or_insert_with(|| Arc::new(OnceLock::new()))
            .clone();
        Erc20Client::with_decimals_cache(&self.rpc, contract, cache)
    }

    /// A USDC client for this wallet's RPC endpoint, resolving the
    /// native contract address from the endpoint's chain id.
    pub async fn usdc(&self) -> Result<UsdcClient<'_>, Error> {
        let chain_id = self.rpc.chain_id().await?;
        UsdcClient::for_chain(&self.rpc, chain_id)
    }
}
