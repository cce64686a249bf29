use bech32::u5;
use std::{
  fmt::{self, Display, Formatter},
  str::FromStr,
};

pub const MAINNET_PREFIX: &str = "bitcoincash";
pub const TESTNET_PREFIX: &str = "bchtest";
pub const REGTEST_PREFIX: &str = "bchreg";

const KNOWN_PREFIXES: [&str; 3] = [MAINNET_PREFIX, TESTNET_PREFIX, REGTEST_PREFIX];

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

const CHECKSUM_LEN: usize = 8;

const GENERATORS: [u64; 5] = [
  0x98_f2bc_8e61,
  0x79_b76d_99e2,
  0xf3_3e5f_b3c4,
  0xae_2eab_e2a8,
  0x1e_4f43_e470,
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CashAddrError {
  #[error("address mixes upper and lower case")]
  MixedCase,
  #[error("address has no payload")]
  Empty,
  #[error("invalid character {0:?}")]
  InvalidChar(char),
  #[error("invalid checksum")]
  Checksum,
  #[error("invalid padding")]
  Padding,
  #[error("hash is {actual} bytes but the version byte announces {expected}")]
  HashLength { expected: usize, actual: usize },
}

/// A CashAddr: network prefix, version byte and hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashAddress {
  prefix: String,
  version: u8,
  hash: Vec<u8>,
}

impl CashAddress {
  pub fn prefix(&self) -> &str {
    &self.prefix
  }

  pub fn version(&self) -> u8 {
    self.version
  }

  pub fn hash(&self) -> &[u8] {
    &self.hash
  }

  /// The same destination on the network named by `prefix`.
  pub fn with_prefix(&self, prefix: &str) -> Self {
    Self {
      prefix: prefix.to_ascii_lowercase(),
      ..self.clone()
    }
  }

  fn hash_len(version: u8) -> usize {
    match version & 0x07 {
      0 => 20,
      1 => 24,
      2 => 28,
      3 => 32,
      4 => 40,
      5 => 48,
      6 => 56,
      _ => 64,
    }
  }

  fn parse_with_prefix(prefix: &str, payload: &str) -> Result<Self, CashAddrError> {
    let values = payload
      .chars()
      .map(|c| {
        CHARSET
          .iter()
          .position(|&b| char::from(b) == c)
          .and_then(|i| u8::try_from(i).ok())
          .and_then(|i| u5::try_from_u8(i).ok())
          .ok_or(CashAddrError::InvalidChar(c))
      })
      .collect::<Result<Vec<u5>, _>>()?;

    if values.len() <= CHECKSUM_LEN {
      return Err(CashAddrError::Empty);
    }

    if polymod(prefix, values.iter().map(|v| v.to_u8())) != 0 {
      return Err(CashAddrError::Checksum);
    }

    let data = &values[..values.len() - CHECKSUM_LEN];
    let bytes = bech32::convert_bits(data, 5, 8, false).map_err(|_| CashAddrError::Padding)?;

    let (&version, hash) = bytes.split_first().ok_or(CashAddrError::Empty)?;

    let expected = Self::hash_len(version);
    if hash.len() != expected {
      return Err(CashAddrError::HashLength {
        expected,
        actual: hash.len(),
      });
    }

    Ok(Self {
      prefix: prefix.to_string(),
      version,
      hash: hash.to_vec(),
    })
  }
}

fn polymod(prefix: &str, values: impl Iterator<Item = u8>) -> u64 {
  let mut c = 1u64;

  let input = prefix
    .bytes()
    .map(|b| b & 0x1f)
    .chain(std::iter::once(0))
    .chain(values);

  for d in input {
    let c0 = c >> 35;
    c = ((c & 0x07_ffff_ffff) << 5) ^ u64::from(d);
    for (i, generator) in GENERATORS.iter().enumerate() {
      if (c0 >> i) & 1 == 1 {
        c ^= generator;
      }
    }
  }

  c ^ 1
}

impl FromStr for CashAddress {
  type Err = CashAddrError;

  /// Parses an address with or without its prefix. Without one, the known
  /// network prefixes are tried in turn.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.chars().any(|c| c.is_ascii_lowercase()) && s.chars().any(|c| c.is_ascii_uppercase()) {
      return Err(CashAddrError::MixedCase);
    }

    let s = s.to_ascii_lowercase();

    match s.split_once(':') {
      Some((prefix, payload)) => Self::parse_with_prefix(prefix, payload),
      None => KNOWN_PREFIXES
        .iter()
        .map(|prefix| Self::parse_with_prefix(prefix, &s))
        .find(Result::is_ok)
        .unwrap_or(Err(CashAddrError::Checksum)),
    }
  }
}

impl Display for CashAddress {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    let mut bytes = Vec::with_capacity(self.hash.len() + 1);
    bytes.push(self.version);
    bytes.extend_from_slice(&self.hash);

    // regrouping whole bytes into 5-bit groups with padding cannot fail
    let mut values = bech32::convert_bits(&bytes, 8, 5, true)
      .map_err(|_| fmt::Error)?
      .into_iter()
      .map(|v| u5::try_from_u8(v).map_err(|_| fmt::Error))
      .collect::<Result<Vec<u5>, fmt::Error>>()?;

    let checksum = polymod(
      &self.prefix,
      values
        .iter()
        .map(|v| v.to_u8())
        .chain([0; CHECKSUM_LEN]),
    );

    for i in 0..CHECKSUM_LEN {
      let value = u8::try_from((checksum >> (5 * (CHECKSUM_LEN - 1 - i))) & 0x1f)
        .map_err(|_| fmt::Error)?;
      values.push(u5::try_from_u8(value).map_err(|_| fmt::Error)?);
    }

    write!(f, "{}:", self.prefix)?;
    for value in values {
      write!(f, "{}", value.to_char())?;
    }

    Ok(())
  }
}

/// Re-encodes `address` for the network named by `prefix`.
pub fn convert(address: &str, prefix: &str) -> Result<String, CashAddrError> {
  Ok(address.parse::<CashAddress>()?.with_prefix(prefix).to_string())
}
