use super::{params::COMMITMENT_HEX_LEN, util::format_coins};
use crate::pinning::types::{NftCapability, TokenUtxo};
use bitcoin::Amount;
use serde::{Deserialize, Serialize};

/// Operating limits published by the service in its parameter token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
  /// Pinning fee in satoshis.
  pub fee: u32,
  /// Largest accepted payload in bytes.
  pub max_size: u32,
}

impl Parameters {
  /// Decodes a commitment of two little-endian `u32`s, fee first, given as
  /// 16 hex characters.
  pub fn from_commitment(commitment: &str) -> Option<Self> {
    if commitment.len() != COMMITMENT_HEX_LEN {
      return None;
    }

    let bytes = hex::decode(commitment).ok()?;
    let fee = u32::from_le_bytes(bytes[0..4].try_into().ok()?);
    let max_size = u32::from_le_bytes(bytes[4..8].try_into().ok()?);

    Some(Self { fee, max_size })
  }

  /// Applies a fresh resolution. Returns whether anything was resolved; on
  /// `false` the previous values are kept.
  pub fn update(&mut self, holdings: &[TokenUtxo]) -> bool {
    match resolve(holdings) {
      Some(parameters) => {
        if parameters != *self {
          log::info!(
            "Service parameters changed: fee {} -> {}, max size {} -> {}",
            self.fee,
            parameters.fee,
            self.max_size,
            parameters.max_size
          );
        }
        *self = parameters;
        true
      }
      None => false,
    }
  }

  pub fn fee_amount(&self) -> Amount {
    Amount::from_sat(u64::from(self.fee))
  }

  pub fn fee_coins(&self) -> String {
    format_coins(self.fee_amount())
  }
}

/// Reads the parameters from the first holding carrying a mutable NFT.
pub fn resolve(holdings: &[TokenUtxo]) -> Option<Parameters> {
  let nft = holdings
    .iter()
    .filter_map(TokenUtxo::nft)
    .find(|nft| nft.capability == NftCapability::Mutable)?;

  let parameters = Parameters::from_commitment(&nft.commitment);
  if parameters.is_none() {
    log::warn!(
      "Ignoring parameter commitment {:?}: expected {} hex characters",
      nft.commitment,
      COMMITMENT_HEX_LEN
    );
  }
  parameters
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pinning::types::{Nft, TokenData};
  use std::str::FromStr;

  fn holding(capability: NftCapability, commitment: &str) -> TokenUtxo {
    TokenUtxo {
      txid: bitcoin::Txid::from_str(
        "1111111111111111111111111111111111111111111111111111111111111111",
      )
      .unwrap(),
      vout: 0,
      height: 0,
      value: 1000,
      token_data: Some(TokenData {
        category: "9c909692e2dcc33150e8ddefb4ae4508b0780880773330d1fffd60cdb4cee6b1".into(),
        amount: "0".into(),
        nft: Some(Nft {
          capability,
          commitment: commitment.into(),
        }),
      }),
    }
  }

  #[test]
  fn test_resolve_commitment() {
    assert_eq!(
      resolve(&[holding(NftCapability::Mutable, "0100000000400000")]),
      Some(Parameters {
        fee: 1,
        max_size: 16384
      })
    );
  }

  #[test]
  fn test_resolve_rejects_wrong_length() {
    assert_eq!(
      resolve(&[holding(NftCapability::Mutable, "010000000040000")]),
      None
    );
    assert_eq!(
      resolve(&[holding(NftCapability::Mutable, "010000000040000000")]),
      None
    );
    assert_eq!(resolve(&[holding(NftCapability::Mutable, "")]), None);
  }

  #[test]
  fn test_resolve_rejects_non_hex() {
    assert_eq!(
      resolve(&[holding(NftCapability::Mutable, "zz00000000400000")]),
      None
    );
  }

  #[test]
  fn test_resolve_only_considers_mutable() {
    assert_eq!(
      resolve(&[
        holding(NftCapability::Minting, "ffffffffffffffff"),
        holding(NftCapability::None, "eeeeeeeeeeeeeeee"),
        holding(NftCapability::Mutable, "a086010000500000"),
        holding(NftCapability::Mutable, "0100000001000000"),
      ]),
      Some(Parameters {
        fee: 100_000,
        max_size: 0x5000
      })
    );
    assert_eq!(resolve(&[holding(NftCapability::Minting, "0100000000400000")]), None);
    assert_eq!(resolve(&[]), None);
  }

  #[test]
  fn test_update_keeps_stale_values() {
    let mut parameters = Parameters::default();
    assert!(parameters.update(&[holding(NftCapability::Mutable, "a086010000500000")]));
    assert_eq!(parameters.fee, 100_000);
    assert_eq!(parameters.max_size, 20480);

    assert!(!parameters.update(&[holding(NftCapability::Mutable, "a0860100005000")]));
    assert_eq!(
      parameters,
      Parameters {
        fee: 100_000,
        max_size: 20480
      }
    );
    assert_eq!(parameters.fee_coins(), "0.001");
    assert_eq!(parameters.fee_amount(), Amount::from_sat(100_000));
  }
}
