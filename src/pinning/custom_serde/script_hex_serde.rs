use bitcoin::ScriptBuf;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

pub struct ScriptHexSerde;

impl ScriptHexSerde {
  pub fn serialize<S>(val: &ScriptBuf, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    String::serialize(&hex::encode(val.as_bytes()), serializer)
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<ScriptBuf, D::Error>
  where
    D: Deserializer<'de>,
  {
    hex::decode(String::deserialize(deserializer)?)
      .map(ScriptBuf::from_bytes)
      .map_err(|e| de::Error::custom(format!("invalid script hex: {}", e)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, PartialEq, Serialize, Deserialize)]
  struct Test {
    #[serde(with = "ScriptHexSerde")]
    v: ScriptBuf,
  }

  #[test]
  fn test_script_serialize_hex() {
    let obj = Test {
      v: ScriptBuf::from_bytes(vec![0x6a, 0x01, 0xff]),
    };
    assert_eq!(serde_json::to_string(&obj).unwrap(), r#"{"v":"6a01ff"}"#);
  }

  #[test]
  fn test_script_deserialize_hex() {
    let obj = serde_json::from_str::<Test>(r#"{"v":"6a0101"}"#).unwrap();
    assert_eq!(obj.v.as_bytes(), &[0x6a, 0x01, 0x01]);
    assert!(serde_json::from_str::<Test>(r#"{"v":"6a0"}"#).is_err());
  }
}
