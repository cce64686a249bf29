use bitcoin::Txid;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

pub struct TxidSerde;

impl TxidSerde {
  pub fn serialize<S>(val: &Txid, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    String::serialize(&val.to_string(), serializer)
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<Txid, D::Error>
  where
    D: Deserializer<'de>,
  {
    Txid::from_str(&String::deserialize(deserializer)?)
      .map_err(|e| de::Error::custom(format!("invalid txid: {}", e)))
  }
}
