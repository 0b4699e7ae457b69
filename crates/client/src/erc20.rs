//! An ERC-20 contract client: balance/allowance reads and
//! transfer/approve/transferFrom calls, with lazily-fetched decimals.

use std::sync::{Arc, OnceLock};

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use usdcwallet_core::abi::{calldata, decode_params, encode_params, AbiType, AbiValue};
use usdcwallet_core::numeric::{bigint_from_decimal_string, decimal_string_from_bigint};
use usdcwallet_core::Account;
use usdcwallet_types::{Address, Error};

use crate::rpc::RpcClient;
use crate::tx_builder::TransactionBuilder;

/// A read/write client bound to one ERC-20 contract address. Cheap to
/// construct; the `decimals` cache cell can be shared across instances
/// bound to the same contract (see [`Erc20Client::with_decimals_cache`])
/// so repeated lookups from a [`crate::wallet::Wallet`] don't re-fetch it.
pub struct Erc20Client<'a> {
    rpc: &'a RpcClient,
    contract: Address,
    decimals: Arc<OnceLock<u8>>,
}

impl<'a> Erc20Client<'a> {
    /// Binds a client to `contract` on `rpc`. No network call happens
    /// until the first method is invoked.
    pub fn new(rpc: &'a RpcClient, contract: Address) -> Self {
        Self {
            rpc,
            contract,
            decimals: Arc::new(OnceLock::new()),
        }
    }

    /// Binds a client sharing an existing `decimals` cache cell, so a
    /// value fetched through one instance is visible to every other
    /// instance bound to the same contract and cache.
    pub fn with_decimals_cache(rpc: &'a RpcClient, contract: Address, decimals: Arc<OnceLock<u8>>) -> Self {
        Self {
            rpc,
            contract,
            decimals,
        }
    }

    /// The contract address this client is bound to.
    pub fn contract(&self) -> Address {
        self.contract
    }

    /// `decimals()`, fetched once and cached for the life of this client.
    pub async fn decimals(&self) -> Result<u8, Error> {
        if let Some(&d) = self.decimals.get() {
            return Ok(d);
        }
        let data = calldata("decimals()", &[]);
        let result = self.rpc.eth_call(None, &self.contract, &data, "latest").await?;
        let decoded = decode_params(&[AbiType::Uint(8)], &result)?;
        let value = match &decoded[0] {
            AbiValue::Uint(n) => n
                .to_u8()
                .ok_or_else(|| Error::Overflow { context: "decimals".into() })?,
            _ => unreachable!(),
        };
        let _ = self.decimals.set(value);
        Ok(value)
    }

    /// `name()`.
    pub async fn name(&self) -> Result<String, Error> {
        self.read_string("name()").await
    }

    /// `symbol()`.
    pub async fn symbol(&self) -> Result<String, Error> {
        self.read_string("symbol()").await
    }

    async fn read_string(&self, signature: &str) -> Result<String, Error> {
        let data = calldata(signature, &[]);
        let result = self.rpc.eth_call(None, &self.contract, &data, "latest").await?;
        let decoded = decode_params(&[AbiType::String], &result)?;
        match &decoded[0] {
            AbiValue::String(s) => Ok(s.clone()),
            _ => unreachable!(),
        }
    }

    /// `balanceOf(account)`, returned as a raw integer (no decimal shift).
    pub async fn balance_of(&self, account: &Address) -> Result<BigInt, Error> {
        let types = vec![AbiType::Address];
        let values = vec![AbiValue::Address(*account)];
        let data = calldata("balanceOf(address)", &encode_params(&types, &values)?);
        let result = self.rpc.eth_call(None, &self.contract, &data, "latest").await?;
        uint_result(&result)
    }

    /// `balanceOf(account)`, formatted as a decimal string using the
    /// contract's own `decimals()`.
    pub async fn balance_of_decimal(&self, account: &Address) -> Result<String, Error> {
        let raw = self.balance_of(account).await?;
        let places = self.decimals().await?;
        decimal_string_from_bigint(&raw, places as u32)
    }

    /// `allowance(owner, spender)`, raw integer.
    pub async fn allowance(&self, owner: &Address, spender: &Address) -> Result<BigInt, Error> {
        let types = vec![AbiType::Address, AbiType::Address];
        let values = vec![AbiValue::Address(*owner), AbiValue::Address(*spender)];
        let data = calldata(
            "allowance(address,address)",
            &encode_params(&types, &values)?,
        );
        let result = self.rpc.eth_call(None, &self.contract, &data, "latest").await?;
        uint_result(&result)
    }

    /// Builds (but does not sign or submit) a `transfer(to, amount)`
    /// call, where `amount` is a decimal string shifted by the
    /// contract's `decimals()`.
    pub async fn transfer(&self, to: Address, amount: &str) -> Result<TransactionBuilder<'a>, Error> {
        let places = self.decimals().await?;
        let raw_amount = bigint_from_decimal_string(amount, places as u32)?;
        self.transfer_raw(to, raw_amount)
    }

    /// As [`Erc20Client::transfer`], but with an already-scaled integer amount.
    pub fn transfer_raw(&self, to: Address, amount: BigInt) -> Result<TransactionBuilder<'a>, Error> {
        let types = vec![AbiType::Address, AbiType::Uint(256)];
        let values = vec![AbiValue::Address(to), AbiValue::Uint(amount)];
        let data = calldata("transfer(address,uint256)", &encode_params(&types, &values)?);
        Ok(TransactionBuilder::new(self.rpc).to(self.contract).data(data))
    }

    /// Builds an `approve(spender, amount)` call with a raw integer amount.
    pub fn approve_raw(&self, spender: Address, amount: BigInt) -> Result<TransactionBuilder<'a>, Error> {
        let types = vec![AbiType::Address, AbiType::Uint(256)];
        let values = vec![AbiValue::Address(spender), AbiValue::Uint(amount)];
        let data = calldata("approve(address,uint256)", &encode_params(&types, &values)?);
        Ok(TransactionBuilder::new(self.rpc).to(self.contract).data(data))
    }

    /// Builds a `transferFrom(from, to, amount)` call with a raw integer amount.
    pub fn transfer_from_raw(
        &self,
        from: Address,
        to: Address,
        amount: BigInt,
    ) -> Result<TransactionBuilder<'a>, Error> {
        let types = vec![AbiType::Address, AbiType::Address, AbiType::Uint(256)];
        let values = vec![
            AbiValue::Address(from),
            AbiValue::Address(to),
            AbiValue::Uint(amount),
        ];
        let data = calldata(
            "transferFrom(address,address,uint256)",
            &encode_params(&types, &values)?,
        );
        Ok(TransactionBuilder::new(self.rpc).to(self.contract).data(data))
    }

    /// Signs and submits `transfer_raw` with `account` in one call.
    pub async fn send_transfer(
        &self,
        account: &Account,
        to: Address,
        amount: BigInt,
    ) -> Result<usdcwallet_types::Digest, Error> {
        self.transfer_raw(to, amount)?.submit(account).await
    }
}

fn uint_result(data: &[u8]) -> Result<BigInt, Error> {
    let decoded = decode_params(&[AbiType::Uint(256)], data)?;
    match &decoded[0] {
        AbiValue::Uint(n) => Ok(n.clone()),
        _ => unreachable!(),
    }
}
