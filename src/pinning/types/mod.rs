pub(super) mod token;
pub(super) mod transaction;

pub use self::{
  token::{Nft, NftCapability, TokenData, TokenUtxo},
  transaction::{ScriptPubKey, WatchedOutput, WatchedTransaction},
};
