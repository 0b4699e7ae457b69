//! Async JSON-RPC transport, transaction building/submission, and
//! ERC-20/USDC contract clients.

pub mod erc20;
pub mod rpc;
pub mod tx_builder;
pub mod usdc;
pub mod wallet;

pub use erc20::Erc20Client;
pub use rpc::{RpcClient, TransactionReceipt};
pub use tx_builder::{SignedTransaction, TransactionBuilder};
pub use usdc::{usdc_address, UsdcClient};
pub use wallet::Wallet;
