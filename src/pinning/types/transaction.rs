use crate::pinning::custom_serde::{BchAmountSerde, ScriptHexSerde, TxidSerde};
use bitcoin::{Amount, Script, ScriptBuf, Txid};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A transaction as delivered by an address subscription, with decoded
/// outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTransaction")]
pub struct WatchedTransaction {
  #[serde(with = "TxidSerde")]
  pub txid: Txid,
  #[serde(rename = "vout")]
  pub outputs: Vec<WatchedOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedOutput {
  #[serde(with = "BchAmountSerde")]
  pub value: Amount,
  #[serde(rename = "scriptPubKey")]
  pub script_pubkey: ScriptPubKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptPubKey {
  #[serde(with = "ScriptHexSerde")]
  pub hex: ScriptBuf,
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
}

// Indexers disagree on whether the id is reported as `txid`, `hash` or both.
#[derive(Deserialize)]
struct RawTransaction {
  txid: Option<String>,
  hash: Option<String>,
  vout: Vec<WatchedOutput>,
}

impl TryFrom<RawTransaction> for WatchedTransaction {
  type Error = String;

  fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
    let id = raw
      .txid
      .or(raw.hash)
      .ok_or_else(|| "transaction has neither `txid` nor `hash`".to_string())?;

    Ok(Self {
      txid: Txid::from_str(&id).map_err(|e| format!("invalid txid {id}: {e}"))?,
      outputs: raw.vout,
    })
  }
}

impl WatchedOutput {
  pub fn script(&self) -> &Script {
    &self.script_pubkey.hex
  }

  pub fn is_null_data(&self) -> bool {
    self.script_pubkey.hex.is_op_return()
  }
}

impl WatchedTransaction {
  pub fn has_output_script(&self, script: &Script) -> bool {
    self.outputs.iter().any(|output| output.script() == script)
  }

  pub fn null_data(&self) -> Option<&Script> {
    self
      .outputs
      .iter()
      .find(|output| output.is_null_data())
      .map(WatchedOutput::script)
  }
}
