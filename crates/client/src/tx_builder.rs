//! A mutable legacy-transaction builder: accumulate fields with
//! validated setters, then sign and submit.
//!
//! `to` and `data` can be set directly or left to a deferred resolver
//! — useful when the recipient or calldata depends on a value that is
//! only known asynchronously (e.g. a freshly fetched nonce, or an ABI
//! encoding that depends on a prior RPC round trip). Resolvers run
//! once, at `sign()`/`submit()` time, not when they're registered.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use num_bigint::BigInt;

use usdcwallet_core::rlp::RlpItem;
use usdcwallet_core::Account;
use usdcwallet_types::{Address, Digest, Error};

use crate::rpc::{RpcClient, TransactionReceipt};

type BoxedResolver<T> =
    Box<dyn Fn() -> Pin<Box<dyn Future<Output = Result<T, Error>> + Send>> + Send + Sync>;

/// Upper bound on a transaction's wei value: 10^6 ETH.
fn max_value_wei() -> BigInt {
    "1000000000000000000000000".parse().expect("constant parses")
}

/// Upper bound on a wei-denominated gas price: 10^12 wei (1000 gwei).
fn max_gas_price_wei() -> BigInt {
    "1000000000000".parse().expect("constant parses")
}

/// Tracks which unit a mutually-exclusive pair of setters was last
/// written through, so writing through the other unit is rejected
/// instead of silently overwriting.
#[derive(Clone, Copy, PartialEq, Eq)]
enum UnitSource {
    Unset,
    Base,
    Alternate,
}

enum Lazy<T> {
    Unset,
    Fixed(T),
    Deferred(BoxedResolver<T>),
}

impl<T: Clone> Lazy<T> {
    async fn resolve(&self, field: &'static str) -> Result<T, Error> {
        match self {
            Lazy::Fixed(v) => Ok(v.clone()),
            Lazy::Deferred(f) => f().await,
            Lazy::Unset => Err(Error::InvalidParameter {
                name: field.into(),
                reason: "not set".into(),
            }),
        }
    }
}

/// A legacy (pre-EIP-1559) Ethereum transaction under construction.
pub struct TransactionBuilder<'a> {
    rpc: &'a RpcClient,
    to: Lazy<Address>,
    data: Lazy<Vec<u8>>,
    value: BigInt,
    value_source: UnitSource,
    nonce: Option<u64>,
    gas_price: Option<u64>,
    gas_price_source: UnitSource,
    gas_limit: Option<u64>,
    chain_id: Option<u64>,
}

impl<'a> TransactionBuilder<'a> {
    /// Starts a new, empty builder bound to `rpc` for defaulting and
    /// submission.
    pub fn new(rpc: &'a RpcClient) -> Self {
        Self {
            rpc,
            to: Lazy::Unset,
            data: Lazy::Unset,
            value: BigInt::from(0),
            value_source: UnitSource::Unset,
            nonce: None,
            gas_price: None,
            gas_price_source: UnitSource::Unset,
            gas_limit: None,
            chain_id: None,
        }
    }

    /// Sets a fixed recipient address.
    pub fn to(mut self, to: Address) -> Self {
        self.to = Lazy::Fixed(to);
        self
    }

    /// Defers recipient resolution until sign/submit time.
    pub fn to_deferred<F, Fut>(mut self, resolver: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Address, Error>> + Send + 'static,
    {
        self.to = Lazy::Deferred(Box::new(move || Box::pin(resolver())));
        self
    }

    /// Sets fixed calldata.
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = Lazy::Fixed(data);
        self
    }

    /// Defers calldata construction until sign/submit time.
    pub fn data_deferred<F, Fut>(mut self, resolver: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<u8>, Error>> + Send + 'static,
    {
        self.data = Lazy::Deferred(Box::new(move || Box::pin(resolver())));
        self
    }

    /// Sets the wei value to transfer alongside the call. Mutually
    /// exclusive with [`set_eth_value`](Self::set_eth_value); must be
    /// under 10^6 ETH.
    pub fn value(mut self, value: BigInt) -> Result<Self, Error> {
        if self.value_source == UnitSource::Alternate {
            return Err(Error::InvalidParameter {
                name: "value".into(),
                reason: "ethValue was already set on this transaction".into(),
            });
        }
        if value < BigInt::from(0) || value >= max_value_wei() {
            return Err(Error::InvalidParameter {
                name: "value".into(),
                reason: "must be between 0 and 10^6 ETH in wei".into(),
            });
        }
        self.value = value;
        self.value_source = UnitSource::Base;
        Ok(self)
    }

    /// Sets the value to transfer, as a decimal ETH string. Mutually
    /// exclusive with [`value`](Self::value); must be under 10^6 ETH.
    pub fn set_eth_value(mut self, eth: &str) -> Result<Self, Error> {
        if self.value_source == UnitSource::Base {
            return Err(Error::InvalidParameter {
                name: "ethValue".into(),
                reason: "weiValue was already set on this transaction".into(),
            });
        }
        let wei = usdcwallet_core::numeric::bigint_from_decimal_string(eth, 18)?;
        if wei < BigInt::from(0) || wei >= max_value_wei() {
            return Err(Error::InvalidParameter {
                name: "ethValue".into(),
                reason: "must be between 0 and 10^6 ETH".into(),
            });
        }
        self.value = wei;
        self.value_source = UnitSource::Alternate;
        Ok(self)
    }

    /// The transaction's value, as a decimal ETH string.
    pub fn eth_value(&self) -> Result<String, Error> {
        usdcwallet_core::numeric::decimal_string_from_bigint(&self.value, 18)
    }

    /// Overrides the nonce (otherwise fetched from the pending count).
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Overrides the gas price in wei (otherwise fetched via
    /// `eth_gasPrice`). Mutually exclusive with
    /// [`set_gas_price_gwei`](Self::set_gas_price_gwei); must be under
    /// 10^12 wei (1000 gwei).
    pub fn gas_price(mut self, gas_price: u64) -> Result<Self, Error> {
        if self.gas_price_source == UnitSource::Alternate {
            return Err(Error::InvalidParameter {
                name: "gasPriceWei".into(),
                reason: "gasPriceGwei was already set on this transaction".into(),
            });
        }
        if BigInt::from(gas_price) > max_gas_price_wei() {
            return Err(Error::InvalidParameter {
                name: "gasPriceWei".into(),
                reason: "must be between 0 and 10^12 wei".into(),
            });
        }
        self.gas_price = Some(gas_price);
        self.gas_price_source = UnitSource::Base;
        Ok(self)
    }

    /// Overrides the gas price in gwei, stored internally as
    /// `floor(gwei * 10^9)` wei. Mutually exclusive with
    /// [`gas_price`](Self::gas_price); must be within `[0, 1000]`.
    pub fn set_gas_price_gwei(mut self, gwei: f64) -> Result<Self, Error> {
        if self.gas_price_source == UnitSource::Base {
            return Err(Error::InvalidParameter {
                name: "gasPriceGwei".into(),
                reason: "gasPriceWei was already set on this transaction".into(),
            });
        }
        if !(0.0..=1000.0).contains(&gwei) {
            return Err(Error::InvalidParameter {
                name: "gasPriceGwei".into(),
                reason: "must be between 0 and 1000".into(),
            });
        }
        self.gas_price = Some((gwei * 1_000_000_000.0).floor() as u64);
        self.gas_price_source = UnitSource::Alternate;
        Ok(self)
    }

    /// The overridden gas price in gwei, if one was set.
    pub fn gas_price_gwei(&self) -> Option<f64> {
        self.gas_price.map(|wei| wei as f64 / 1_000_000_000.0)
    }

    /// Overrides the gas limit (otherwise fetched via `eth_estimateGas`).
    /// Must be within `[21000, 20000000]`.
    pub fn gas_limit(mut self, gas_limit: u64) -> Result<Self, Error> {
        if !(21_000..=20_000_000).contains(&gas_limit) {
            return Err(Error::InvalidParameter {
                name: "gasLimit".into(),
                reason: "must be between 21000 and 20000000".into(),
            });
        }
        self.gas_limit = Some(gas_limit);
        Ok(self)
    }

    /// Overrides the chain id used for EIP-155 `v` (otherwise fetched
    /// via `eth_chainId`).
    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Resolves every field, signs with `account`, and returns the
    /// raw RLP-encoded transaction bytes plus the transaction hash
    /// that `eth_sendRawTransaction` will report — computed locally so
    /// the caller can use it before submitting, and never derived from
    /// the submission response itself.
    pub async fn sign(&self, account: &Account) -> Result<SignedTransaction, Error> {
        let to = self.to.resolve("to").await?;
        let data = match &self.data {
            Lazy::Unset => Vec::new(),
            other => other.resolve("data").await?,
        };
        // None of these four lookups depends on another's result, so they
        // run concurrently rather than as four sequential round trips.
        let chain_id_fut = async {
            match self.chain_id {
                Some(id) => Ok(id),
                None => self.rpc.chain_id().await,
            }
        };
        let nonce_fut = async {
            match self.nonce {
                Some(n) => Ok(n),
                None => self.rpc.transaction_count(&account.address(), "latest").await,
            }
        };
        let gas_price_fut = async {
            match self.gas_price {
                Some(p) => Ok(p),
                None => self.rpc.gas_price().await,
            }
        };
        let gas_limit_fut = async {
            match self.gas_limit {
                Some(g) => Ok(g),
                None => {
                    let estimate = self
                        .rpc
                        .estimate_gas(&account.address(), Some(&to), &data, Some(&self.value))
                        .await?;
                    Ok(buffer_gas_estimate(estimate))
                }
            }
        };
        let (chain_id, nonce, gas_price, gas_limit) =
            tokio::try_join!(chain_id_fut, nonce_fut, gas_price_fut, gas_limit_fut)?;

        let unsigned = UnsignedFields {
            nonce,
            gas_price,
            gas_limit,
            to,
            value: self.value.clone(),
            data: data.clone(),
        };

        let signing_digest = usdcwallet_core::keccak::keccak256(&encode_for_signing(&unsigned, chain_id)?);
        let signature = account.sign_digest(&signing_digest, Some(chain_id));
        let raw = encode_signed(&unsigned, &signature)?;
        let hash = usdcwallet_core::keccak::keccak256(&raw);

        Ok(SignedTransaction {
            raw,
            transaction_hash: hash,
        })
    }

    /// Signs and submits via `eth_sendRawTransaction`. Some nodes reject
    /// a resubmission of a transaction they already have in the mempool
    /// with an error rather than the original hash; that case is treated
    /// as success rather than propagated.
    pub async fn submit(&self, account: &Account) -> Result<Digest, Error> {
        let signed = self.sign(account).await?;
        match self.rpc.send_raw_transaction(&signed.raw).await {
            Ok(hash) => Ok(hash),
            Err(Error::Rpc { message, .. }) if is_already_known(&message) => {
                Ok(signed.transaction_hash)
            }
            Err(err) => Err(err),
        }
    }

    /// Signs, submits, and polls `eth_getTransactionReceipt` until
    /// mined or `timeout` elapses.
    pub async fn submit_and_wait(
        &self,
        account: &Account,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<TransactionReceipt, Error> {
        let hash = self.submit(account).await?;
        self.rpc.wait_for_receipt(&hash, poll_interval, timeout).await
    }
}

struct UnsignedFields {
    nonce: u64,
    gas_price: u64,
    gas_limit: u64,
    to: Address,
    value: BigInt,
    data: Vec<u8>,
}

/// A fully-signed raw transaction, ready for `eth_sendRawTransaction`.
pub struct SignedTransaction {
    /// RLP-encoded `[nonce, gasPrice, gasLimit, to, value, data, v, r, s]`.
    pub raw: Vec<u8>,
    /// `keccak256(raw)`, computed locally — not read back from the
    /// submission response.
    pub transaction_hash: Digest,
}

fn encode_for_signing(fields: &UnsignedFields, chain_id: u64) -> Result<Vec<u8>, Error> {
    // EIP-155: sign over [nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0].
    Ok(RlpItem::List(vec![
        RlpItem::uint(fields.nonce),
        RlpItem::uint(fields.gas_price),
        RlpItem::uint(fields.gas_limit),
        RlpItem::bytes(fields.to.as_bytes().to_vec()),
        RlpItem::bytes(usdcwallet_core::numeric::bytes_from_bigint(&fields.value)),
        RlpItem::bytes(fields.data.clone()),
        RlpItem::uint(chain_id),
        RlpItem::bytes(Vec::new()),
        RlpItem::bytes(Vec::new()),
    ])
    .encode()?)
}

fn encode_signed(fields: &UnsignedFields, signature: &usdcwallet_types::Signature) -> Result<Vec<u8>, Error> {
    Ok(RlpItem::List(vec![
        RlpItem::uint(fields.nonce),
        RlpItem::uint(fields.gas_price),
        RlpItem::uint(fields.gas_limit),
        RlpItem::bytes(fields.to.as_bytes().to_vec()),
        RlpItem::bytes(usdcwallet_core::numeric::bytes_from_bigint(&fields.value)),
        RlpItem::bytes(fields.data.clone()),
        RlpItem::uint(signature.v),
        RlpItem::bytes(trim_leading_zeros(&signature.r)),
        RlpItem::bytes(trim_leading_zeros(&signature.s)),
    ])
    .encode()?)
}

/// Applies a 1.5x safety margin to an `eth_estimateGas` result, except
/// for plain value transfers (exactly 21000), which are exact and never
/// vary with execution path.
fn buffer_gas_estimate(estimate: u64) -> u64 {
    if estimate == 21_000 {
        return estimate;
    }
    estimate + estimate / 2
}

/// Matches the class of RPC errors nodes return for a transaction they
/// already hold, case-insensitively (e.g. "already known", "transaction
/// already imported").
fn is_already_known(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("known") || lower.contains("imported")
}

fn trim_leading_zeros(word: &[u8; 32]) -> Vec<u8> {
    let first_nonzero = word.iter().position(|&b| b != 0);
    match first_nonzero {
        Some(i) => word[i..].to_vec(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_leading_zero_bytes() {
        let mut word = [0u8; 32];
        word[30] = 0x01;
        word[31] = 0x02;
        assert_eq!(trim_leading_zeros(&word), vec![0x01, 0x02]);
    }

    #[test]
    fn trims_to_empty_for_zero() {
        assert_eq!(trim_leading_zeros(&[0u8; 32]), Vec::<u8>::new());
    }

    #[test]
    fn buffers_non_transfer_estimates_by_half() {
        assert_eq!(buffer_gas_estimate(100_000), 150_000);
    }

    #[test]
    fn leaves_plain_transfer_estimate_unbuffered() {
        assert_eq!(buffer_gas_estimate(21_000), 21_000);
    }

    #[test]
    fn recognizes_already_known_and_imported_messages() {
        assert!(is_already_known("already known"));
        assert!(is_already_known("Transaction already IMPORTED"));
        assert!(!is_already_known("insufficient funds for gas"));
    }

    #[test]
    fn value_and_eth_value_are_mutually_exclusive() {
        let rpc = RpcClient::new("http://localhost");
        let builder = TransactionBuilder::new(&rpc).value(BigInt::from(1)).unwrap();
        assert!(matches!(
            builder.set_eth_value("1"),
            Err(Error::InvalidParameter { name, .. }) if name == "ethValue"
        ));

        let builder = TransactionBuilder::new(&rpc).set_eth_value("1").unwrap();
        assert!(matches!(
            builder.value(BigInt::from(1)),
            Err(Error::InvalidParameter { name, .. }) if name == "value"
        ));
    }

    #[test]
    fn eth_value_rejects_amounts_at_or_above_the_cap() {
        let rpc = RpcClient::new("http://localhost");
        assert!(TransactionBuilder::new(&rpc)
            .set_eth_value("1000000")
            .is_err());
        assert!(TransactionBuilder::new(&rpc)
            .set_eth_value("999999")
            .is_ok());
    }

    #[test]
    fn eth_value_round_trips_through_value_getter() {
        let rpc = RpcClient::new("http://localhost");
        let builder = TransactionBuilder::new(&rpc).set_eth_value("1.5").unwrap();
        assert_eq!(builder.eth_value().unwrap(), "1.5");
    }

    #[test]
    fn gas_price_and_gas_price_gwei_are_mutually_exclusive() {
        let rpc = RpcClient::new("http://localhost");
        let builder = TransactionBuilder::new(&rpc).gas_price(1).unwrap();
        assert!(builder.set_gas_price_gwei(1.0).is_err());

        let builder = TransactionBuilder::new(&rpc).set_gas_price_gwei(1.0).unwrap();
        assert!(builder.gas_price(1).is_err());
    }

    #[test]
    fn gas_price_gwei_rejects_out_of_range_values() {
        let rpc = RpcClient::new("http://localhost");
        assert!(TransactionBuilder::new(&rpc).set_gas_price_gwei(-1.0).is_err());
        assert!(TransactionBuilder::new(&rpc).set_gas_price_gwei(1001.0).is_err());
        assert!(TransactionBuilder::new(&rpc).set_gas_price_gwei(1000.0).is_ok());
    }

    #[test]
    fn gas_price_gwei_getter_derives_from_stored_wei() {
        let rpc = RpcClient::new("http://localhost");
        let builder = TransactionBuilder::new(&rpc).set_gas_price_gwei(2.5).unwrap();
        assert_eq!(builder.gas_price_gwei(), Some(2.5));
    }

    #[test]
    fn gas_limit_rejects_out_of_range_values() {
        let rpc = RpcClient::new("http://localhost");
        assert!(TransactionBuilder::new(&rpc).gas_limit(20_999).is_err());
        assert!(TransactionBuilder::new(&rpc).gas_limit(20_000_001).is_err());
        assert!(TransactionBuilder::new(&rpc).gas_limit(21_000).is_ok());
    }

    #[test]
    fn signing_payload_is_a_nine_element_list() {
        let fields = UnsignedFields {
            nonce: 0,
            gas_price: 1_000_000_000,
            gas_limit: 21_000,
            to: Address::from_bytes([0x11; 20]),
            value: BigInt::from(0),
            data: Vec::new(),
        };
        let encoded = encode_for_signing(&fields, 1).unwrap();
        // just confirm it parses as a non-trivial RLP list, not empty
        assert!(!encoded.is_empty());
        assert!(encoded[0] >= 0xc0);
    }
}
