use bitcoin::Amount;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Output values as whole-coin decimal numbers, the way indexers report them.
pub struct BchAmountSerde;

impl BchAmountSerde {
  pub fn serialize<S>(val: &Amount, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    f64::serialize(&val.to_btc(), serializer)
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
  where
    D: Deserializer<'de>,
  {
    Amount::from_btc(f64::deserialize(deserializer)?)
      .map_err(|e| de::Error::custom(format!("invalid amount: {}", e)))
  }
}
