//! USDC-specific contract client: chain-keyed contract address
//! resolution, EIP-2612 `permit`, and EIP-3009
//! `transferWithAuthorization`.

use std::sync::OnceLock;

use num_bigint::BigInt;

use usdcwallet_core::abi::{calldata, encode_params, AbiType, AbiValue};
use usdcwallet_core::eip712::{self, Permit, TransferWithAuthorization, TypedMessage};
use usdcwallet_core::numeric::max_uint256;
use usdcwallet_core::Account;
use usdcwallet_types::{Address, Digest, Error, Signature};

use crate::erc20::Erc20Client;
use crate::rpc::RpcClient;
use crate::tx_builder::TransactionBuilder;

/// Native USDC contract addresses keyed by chain id.
const USDC_ADDRESSES: &[(u64, &str)] = &[
    (1, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), // Ethereum mainnet
    (3, "0x07865c6E87B9F70255377e024ace6630C1Eaa37F"), // Ropsten
    (4, "0x705de9dc3ad85e072ab34cf6850e6b2bd317ccc1"), // Rinkeby
    (5, "0x2f3a40a3db8a7e3d09b0adfefbce4f6f81927557"), // Goerli
    (137, "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"), // Polygon PoS
    (80001, "0xe6b8a5CF854791412c1f6EFC7CAf629f5Df1c747"), // Polygon Mumbai
];

/// Looks up the native USDC contract address for `chain_id`.
pub fn usdc_address(chain_id: u64) -> Result<Address, Error> {
    USDC_ADDRESSES
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map(|(_, addr)| Address::parse_hex(addr).expect("table entries are valid addresses"))
        .ok_or(Error::UnsupportedChain { chain_id })
}

/// A USDC client: an ERC-20 client plus EIP-2612/EIP-3009 signing.
pub struct UsdcClient<'a> {
    erc20: Erc20Client<'a>,
    rpc: &'a RpcClient,
    domain_separator: OnceLock<Digest>,
}

impl<'a> UsdcClient<'a> {
    /// Binds a client to the native USDC contract on `chain_id`.
    pub fn for_chain(rpc: &'a RpcClient, chain_id: u64) -> Result<Self, Error> {
        let contract = usdc_address(chain_id)?;
        Ok(Self {
            erc20: Erc20Client::new(rpc, contract),
            rpc,
            domain_separator: OnceLock::new(),
        })
    }

    /// Binds a client to an explicit contract address (for testnets or
    /// non-canonical deployments).
    pub fn with_contract(rpc: &'a RpcClient, contract: Address) -> Self {
        Self {
            erc20: Erc20Client::new(rpc, contract),
            rpc,
            domain_separator: OnceLock::new(),
        }
    }

    /// The underlying ERC-20 client (balances, allowance, transfer).
    pub fn erc20(&self) -> &Erc20Client<'a> {
        &self.erc20
    }

    /// Fetches and caches the contract's `DOMAIN_SEPARATOR()`. The wallet
    /// never reconstructs this value locally from name/version/chainId,
    /// since that would drift silently if the contract's own derivation
    /// ever changed.
    async fn domain_separator(&self) -> Result<&Digest, Error> {
        if let Some(d) = self.domain_separator.get() {
            return Ok(d);
        }
        let data = calldata("DOMAIN_SEPARATOR()", &[]);
        let result = self
            .rpc
            .eth_call(None, &self.erc20.contract(), &data, "latest")
            .await?;
        let separator: Digest = result.try_into().map_err(|bytes: Vec<u8>| Error::Rpc {
            message: format!(
                "DOMAIN_SEPARATOR() returned {} bytes, expected 32",
                bytes.len()
            ),
            code: 0,
            data: None,
            status: 0,
        })?;
        Ok(self.domain_separator.get_or_init(|| separator))
    }

    /// `nonces(owner)` from the EIP-2612 permit extension.
    pub async fn permit_nonce(&self, owner: &Address) -> Result<BigInt, Error> {
        let types = vec![AbiType::Address];
        let values = vec![AbiValue::Address(*owner)];
        let data = calldata("nonces(address)", &encode_params(&types, &values)?);
        let result = self
            .rpc
            .eth_call(None, &self.erc20.contract(), &data, "latest")
            .await?;
        let decoded = usdcwallet_core::abi::decode_params(&[AbiType::Uint(256)], &result)?;
        match &decoded[0] {
            AbiValue::Uint(n) => Ok(n.clone()),
            _ => unreachable!(),
        }
    }

    /// Signs an EIP-2612 `permit` message authorizing `spender` to
    /// spend `allowance` of `owner`'s balance, with `deadline`
    /// (defaulting to `u256::MAX`, i.e. no expiry) and `nonce`
    /// (defaulting to the current on-chain nonce). The returned
    /// [`SignedPermit`] carries the resolved nonce and deadline
    /// alongside the signature so [`submit_permit`](Self::submit_permit)
    /// never has to be given values that could drift from what was
    /// actually signed.
    pub async fn sign_permit(
        &self,
        owner: &Account,
        spender: Address,
        allowance: BigInt,
        deadline: Option<BigInt>,
        nonce: Option<BigInt>,
    ) -> Result<SignedPermit, Error> {
        let nonce = match nonce {
            Some(n) => n,
            None => self.permit_nonce(&owner.address()).await?,
        };
        let deadline = deadline.unwrap_or_else(max_uint256);
        let separator = self.domain_separator().await?;
        let message = TypedMessage::Permit(Permit {
            owner: owner.address(),
            spender,
            value: allowance.clone(),
            nonce: nonce.clone(),
            deadline: deadline.clone(),
        });
        let digest = eip712::digest(separator, &message);
        let signature = owner.sign_digest(&digest, None);
        Ok(SignedPermit {
            owner: owner.address(),
            spender,
            allowance,
            nonce,
            deadline,
            signature,
        })
    }

    /// Builds a `permit(owner, spender, value, deadline, v, r, s)` call
    /// from a [`SignedPermit`] produced by
    /// [`sign_permit`](Self::sign_permit).
    pub fn submit_permit(&self, permit: &SignedPermit) -> Result<TransactionBuilder<'a>, Error> {
        let types = vec![
            AbiType::Address,
            AbiType::Address,
            AbiType::Uint(256),
            AbiType::Uint(256),
            AbiType::Uint(8),
            AbiType::FixedBytes(32),
            AbiType::FixedBytes(32),
        ];
        let values = vec![
            AbiValue::Address(permit.owner),
            AbiValue::Address(permit.spender),
            AbiValue::Uint(permit.allowance.clone()),
            AbiValue::Uint(permit.deadline.clone()),
            AbiValue::Uint(BigInt::from(permit.signature.v)),
            AbiValue::FixedBytes(permit.signature.r.to_vec()),
            AbiValue::FixedBytes(permit.signature.s.to_vec()),
        ];
        let data = calldata(
            "permit(address,address,uint256,uint256,uint8,bytes32,bytes32)",
            &encode_params(&types, &values)?,
        );
        Ok(TransactionBuilder::new(self.rpc)
            .to(self.erc20.contract())
            .data(data))
    }

    /// Signs an EIP-3009 `transferWithAuthorization` message moving
    /// `value` from `from` to `to`. `valid_after` defaults to 0,
    /// `valid_before` to `u256::MAX` (i.e. no expiry window), and
    /// `nonce` to a fresh random 32 bytes (EIP-3009 nonces are
    /// arbitrary, not sequential, so a caller with no preference should
    /// never have to mint one). The returned [`SignedTransferAuth`]
    /// carries every resolved value alongside the signature.
    pub async fn sign_transfer_authorization(
        &self,
        from: &Account,
        to: Address,
        value: BigInt,
        valid_after: Option<BigInt>,
        valid_before: Option<BigInt>,
        nonce: Option<Digest>,
    ) -> Result<SignedTransferAuth, Error> {
        let valid_after = valid_after.unwrap_or_else(|| BigInt::from(0));
        let valid_before = valid_before.unwrap_or_else(max_uint256);
        let nonce = nonce.unwrap_or_else(random_nonce);
        let separator = self.domain_separator().await?;
        let message = TypedMessage::TransferWithAuthorization(TransferWithAuthorization {
            from: from.address(),
            to,
            value: value.clone(),
            valid_after: valid_after.clone(),
            valid_before: valid_before.clone(),
            nonce,
        });
        let digest = eip712::digest(separator, &message);
        let signature = from.sign_digest(&digest, None);
        Ok(SignedTransferAuth {
            from: from.address(),
            to,
            value,
            valid_after,
            valid_before,
            nonce,
            signature,
        })
    }

    /// Builds a `transferWithAuthorization(...)` call from a
    /// [`SignedTransferAuth`] produced by
    /// [`sign_transfer_authorization`](Self::sign_transfer_authorization).
    pub fn submit_transfer_authorization(
        &self,
        auth: &SignedTransferAuth,
    ) -> Result<TransactionBuilder<'a>, Error> {
        let types = vec![
            AbiType::Address,
            AbiType::Address,
            AbiType::Uint(256),
            AbiType::Uint(256),
            AbiType::Uint(256),
            AbiType::FixedBytes(32),
            AbiType::Uint(8),
            AbiType::FixedBytes(32),
            AbiType::FixedBytes(32),
        ];
        let values = vec![
            AbiValue::Address(auth.from),
            AbiValue::Address(auth.to),
            AbiValue::Uint(auth.value.clone()),
            AbiValue::Uint(auth.valid_after.clone()),
            AbiValue::Uint(auth.valid_before.clone()),
            AbiValue::FixedBytes(auth.nonce.to_vec()),
            AbiValue::Uint(BigInt::from(auth.signature.v)),
            AbiValue::FixedBytes(auth.signature.r.to_vec()),
            AbiValue::FixedBytes(auth.signature.s.to_vec()),
        ];
        let data = calldata(
            "transferWithAuthorization(address,address,uint256,uint256,uint256,bytes32,uint8,bytes32,bytes32)",
            &encode_params(&types, &values)?,
        );
        Ok(TransactionBuilder::new(self.rpc)
            .to(self.erc20.contract())
            .data(data))
    }
}

/// A fresh, uniformly random EIP-3009 nonce.
fn random_nonce() -> Digest {
    let mut nonce = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut nonce);
    nonce
}

/// A signed EIP-2612 `permit`, paired with the exact nonce and deadline
/// that went into the signature so [`UsdcClient::submit_permit`] can
/// never be called with mismatched values.
#[derive(Debug, Clone)]
pub struct SignedPermit {
    pub owner: Address,
    pub spender: Address,
    pub allowance: BigInt,
    pub nonce: BigInt,
    pub deadline: BigInt,
    pub signature: Signature,
}

/// A signed EIP-3009 `transferWithAuthorization`, paired with the exact
/// validity window and nonce that went into the signature so
/// [`UsdcClient::submit_transfer_authorization`] can never be called
/// with mismatched values.
#[derive(Debug, Clone)]
pub struct SignedTransferAuth {
    pub from: Address,
    pub to: Address,
    pub value: BigInt,
    pub valid_after: BigInt,
    pub valid_before: BigInt,
    pub nonce: Digest,
    pub signature: Signature,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_chain() {
        let address = usdc_address(1).unwrap();
        assert_eq!(
            address.to_string(),
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
        );
    }

    #[test]
    fn resolves_polygon() {
        let address = usdc_address(137).unwrap();
        assert_eq!(
            address.to_string(),
            "0x2791bca1f2de4661ed88a30c99a7a9449aa84174"
        );
    }

    #[test]
    fn rejects_unknown_chain() {
        assert!(matches!(
            usdc_address(999),
            Err(Error::UnsupportedChain { chain_id: 999 })
        ));
    }
}
