use crate::pinning::custom_serde::TxidSerde;
use bitcoin::Txid;
use serde::{Deserialize, Serialize};

/// An unspent output holding CashTokens, as listed by an indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUtxo {
  #[serde(rename = "tx_hash", with = "TxidSerde")]
  pub txid: Txid,
  #[serde(rename = "tx_pos")]
  pub vout: u32,
  #[serde(default)]
  pub height: i64,
  pub value: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub token_data: Option<TokenData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenData {
  pub category: String,
  #[serde(default)]
  pub amount: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub nft: Option<Nft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nft {
  pub capability: NftCapability,
  #[serde(default)]
  pub commitment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NftCapability {
  None,
  Mutable,
  Minting,
}

impl TokenUtxo {
  pub fn category(&self) -> Option<&str> {
    self.token_data.as_ref().map(|token| token.category.as_str())
  }

  pub fn nft(&self) -> Option<&Nft> {
    self.token_data.as_ref().and_then(|token| token.nft.as_ref())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_deserialize_listunspent_entry() {
    let utxo = serde_json::from_str::<TokenUtxo>(
      r#"{
  "tx_hash": "9c909692e2dcc33150e8ddefb4ae4508b0780880773330d1fffd60cdb4cee6b1",
  "tx_pos": 1,
  "height": 792000,
  "value": 1000,
  "token_data": {
    "category": "9c909692e2dcc33150e8ddefb4ae4508b0780880773330d1fffd60cdb4cee6b1",
    "amount": "0",
    "nft": { "capability": "mutable", "commitment": "a086010000500000" }
  }
}"#,
    )
    .unwrap();

    assert_eq!(utxo.vout, 1);
    assert_eq!(
      utxo.category(),
      Some("9c909692e2dcc33150e8ddefb4ae4508b0780880773330d1fffd60cdb4cee6b1")
    );
    assert_eq!(utxo.nft().unwrap().capability, NftCapability::Mutable);
    assert_eq!(utxo.nft().unwrap().commitment, "a086010000500000");
  }

  #[test]
  fn test_deserialize_plain_utxo() {
    let utxo = serde_json::from_str::<TokenUtxo>(
      r#"{"tx_hash": "1111111111111111111111111111111111111111111111111111111111111111", "tx_pos": 0, "value": 546}"#,
    )
    .unwrap();
    assert_eq!(utxo.category(), None);
    assert_eq!(utxo.nft(), None);
  }
}
