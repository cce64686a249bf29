use super::params::{MAX_CHUNK_LEN, MAX_URL_BYTE_COUNT};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
  #[error("encoding error: {0}")]
  Encoding(#[from] EncodingError),

  #[error("parse error: {0}")]
  Parse(#[from] ParseError),

  #[error("validation error: {0}")]
  Validation(#[from] ValidationError),

  #[error("network error: {0}")]
  Network(#[from] NetworkError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
  #[error("chunk {index} is {len} bytes, the largest pushable chunk is {MAX_CHUNK_LEN} bytes")]
  ChunkTooLarge { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
  #[error("script is empty")]
  Empty,

  #[error("script does not start with OP_RETURN but with {0:#04x}")]
  MissingMarker(u8),

  #[error("unsupported opcode {opcode:#04x} at offset {offset}")]
  UnsupportedOpcode { offset: usize, opcode: u8 },

  #[error("push at offset {offset} needs {needed} bytes but only {remaining} remain")]
  Truncated {
    offset: usize,
    needed: usize,
    remaining: usize,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
  #[error("Invalid URL: {0}")]
  InvalidUrl(String),

  #[error("URL length too long ({0}) to fit into OP_RETURN, at most {MAX_URL_BYTE_COUNT} bytes")]
  UrlTooLong(usize),

  #[error("Empty data")]
  EmptyPayload,

  #[error("Data size {size} exceeds the {max} bytes limit")]
  PayloadTooLarge { size: u64, max: u64 },

  #[error("Remote content size {size} exceeds the {max} bytes limit")]
  RemoteTooLarge { size: u64, max: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
  #[error("request to {url} failed: {message}")]
  Transport { url: String, message: String },

  #[error("request to {url} timed out")]
  Timeout { url: String },

  #[error("request to {url} returned status {status}")]
  Status { url: String, status: u16 },

  #[error("request was cancelled")]
  Cancelled,

  #[error("upload rejected: {0}")]
  Upload(String),
}

impl NetworkError {
  pub(crate) fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
    if error.is_timeout() {
      Self::Timeout {
        url: url.to_string(),
      }
    } else if let Some(status) = error.status() {
      Self::Status {
        url: url.to_string(),
        status: status.as_u16(),
      }
    } else {
      Self::Transport {
        url: url.to_string(),
        message: error.to_string(),
      }
    }
  }
}

/// Structural violations of the receipt contract. Receipts failing these
/// checks belong to unrelated traffic on the receipt address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
  #[error("no null-data output")]
  NoNullData,

  #[error("malformed null-data output: {0}")]
  Malformed(#[from] ParseError),

  #[error("expected {expected} chunks, got {actual}")]
  ChunkCount { expected: usize, actual: usize },

  #[error("not an IPBC message")]
  NotIpbc,

  #[error("receipt references {0}, not the watched deposit")]
  CorrelationMismatch(String),
}

/// Receipts that pass the structural checks for the current deposit but carry
/// content this client does not understand.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum UnrecognizedFormat {
  #[error("Unknown refund reason {0}")]
  RefundReason(String),

  #[error("Unknown receipt format {0}")]
  Receipt(String),
}
