use super::{
  error::{ProtocolError, UnrecognizedFormat},
  params::{DONE_LITERAL, PROTOCOL_LITERAL, RECEIPT_CHUNK_COUNT, REFUND_LITERAL},
  resolver::Parameters,
  script,
  util::chunk_text,
};
use crate::pinning::{
  custom_serde::{ScriptHexSerde, TxidSerde},
  types::WatchedTransaction,
};
use bitcoin::{ScriptBuf, Txid};
use serde::{Deserialize, Serialize};
use std::{
  fmt::{self, Display, Formatter},
  str::FromStr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundReason {
  NotIpbc,
  FeeNotPaid,
  DlFail,
}

impl RefundReason {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::NotIpbc => "NOT_IPBC",
      Self::FeeNotPaid => "FEE_NOT_PAID",
      Self::DlFail => "DL_FAIL",
    }
  }

  pub fn description(self, parameters: &Parameters) -> String {
    match self {
      Self::NotIpbc => "Not an IPBC transaction".to_string(),
      Self::FeeNotPaid => format!(
        "Did not pay required fee - {} BCH",
        parameters.fee_coins()
      ),
      Self::DlFail => "Service was not able to download remote data and pin it".to_string(),
    }
  }
}

impl FromStr for RefundReason {
  type Err = UnrecognizedFormat;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "NOT_IPBC" => Ok(Self::NotIpbc),
      "FEE_NOT_PAID" => Ok(Self::FeeNotPaid),
      "DL_FAIL" => Ok(Self::DlFail),
      other => Err(UnrecognizedFormat::RefundReason(other.to_string())),
    }
  }
}

impl Display for RefundReason {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
  Done,
  Refund,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEvent {
  #[serde(with = "TxidSerde")]
  pub txid: Txid,
  #[serde(with = "ScriptHexSerde")]
  pub matched_script: ScriptBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptEvent {
  #[serde(with = "TxidSerde")]
  pub txid: Txid,
  pub status: ReceiptStatus,
  pub correlation_id: String,
  #[serde(with = "hex::serde")]
  pub payload: Vec<u8>,
}

impl ReceiptEvent {
  /// The content identifier of a `DONE` receipt, or the reason text of a
  /// `REFUND`.
  pub fn payload_text(&self) -> String {
    chunk_text(&self.payload)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
  Done(ReceiptEvent),
  Refund {
    receipt: ReceiptEvent,
    reason: RefundReason,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReceiptError {
  #[error(transparent)]
  Protocol(#[from] ProtocolError),

  #[error(transparent)]
  Unrecognized(#[from] UnrecognizedFormat),
}

/// Classifies a transaction seen on the receipt address against the deposit
/// it should settle.
pub fn classify_receipt(
  tx: &WatchedTransaction,
  deposit_txid: &Txid,
) -> Result<Settlement, ReceiptError> {
  let null_data = tx.null_data().ok_or(ProtocolError::NoNullData)?;
  let chunks = script::decode(null_data).map_err(ProtocolError::Malformed)?;

  if chunks.len() != RECEIPT_CHUNK_COUNT {
    return Err(
      ProtocolError::ChunkCount {
        expected: RECEIPT_CHUNK_COUNT,
        actual: chunks.len(),
      }
      .into(),
    );
  }

  if chunks[0] != PROTOCOL_LITERAL {
    return Err(ProtocolError::NotIpbc.into());
  }

  let correlation_id = chunk_text(&chunks[2]);
  if !correlation_id.eq_ignore_ascii_case(&deposit_txid.to_string()) {
    return Err(ProtocolError::CorrelationMismatch(correlation_id).into());
  }

  let status = if chunks[1] == DONE_LITERAL {
    ReceiptStatus::Done
  } else if chunks[1] == REFUND_LITERAL {
    ReceiptStatus::Refund
  } else {
    return Err(
      UnrecognizedFormat::Receipt(
        chunks
          .iter()
          .map(|chunk| chunk_text(chunk))
          .collect::<Vec<String>>()
          .join(" "),
      )
      .into(),
    );
  };

  let receipt = ReceiptEvent {
    txid: tx.txid,
    status,
    correlation_id,
    payload: chunks[3].clone(),
  };

  match status {
    ReceiptStatus::Done => Ok(Settlement::Done(receipt)),
    ReceiptStatus::Refund => {
      let reason = receipt.payload_text().parse::<RefundReason>()?;
      Ok(Settlement::Refund { receipt, reason })
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::pinning::types::{ScriptPubKey, WatchedOutput};
  use bitcoin::Amount;

  pub(crate) fn txid(n: u8) -> Txid {
    Txid::from_str(&format!("{:02x}", n).repeat(32)).unwrap()
  }

  pub(crate) fn transaction(txid: Txid, scripts: &[ScriptBuf]) -> WatchedTransaction {
    WatchedTransaction {
      txid,
      outputs: scripts
        .iter()
        .map(|script| WatchedOutput {
          value: if script.is_op_return() {
            Amount::ZERO
          } else {
            Amount::from_sat(1000)
          },
          script_pubkey: ScriptPubKey {
            hex: script.clone(),
            kind: None,
          },
        })
        .collect(),
    }
  }

  pub(crate) fn receipt(receipt_txid: Txid, chunks: &[&str]) -> WatchedTransaction {
    transaction(
      receipt_txid,
      &[
        ScriptBuf::from_bytes(vec![0x76, 0xa9]),
        script::encode(chunks).unwrap(),
      ],
    )
  }

  #[test]
  fn test_classify_done() {
    let deposit = txid(1);
    let tx = receipt(txid(2), &["IPBC", "DONE", &deposit.to_string(), "bafyabc"]);
    assert_eq!(
      classify_receipt(&tx, &deposit).unwrap(),
      Settlement::Done(ReceiptEvent {
        txid: txid(2),
        status: ReceiptStatus::Done,
        correlation_id: deposit.to_string(),
        payload: b"bafyabc".to_vec(),
      })
    );
  }

  #[test]
  fn test_classify_refunds() {
    let deposit = txid(1);
    for (text, reason) in [
      ("NOT_IPBC", RefundReason::NotIpbc),
      ("FEE_NOT_PAID", RefundReason::FeeNotPaid),
      ("DL_FAIL", RefundReason::DlFail),
    ] {
      let tx = receipt(txid(2), &["IPBC", "REFUND", &deposit.to_string(), text]);
      match classify_receipt(&tx, &deposit).unwrap() {
        Settlement::Refund { receipt, reason: r } => {
          assert_eq!(r, reason);
          assert_eq!(receipt.status, ReceiptStatus::Refund);
          assert_eq!(receipt.payload_text(), text);
        }
        other => panic!("unexpected settlement {other:?}"),
      }
    }
  }

  #[test]
  fn test_classify_unknown_refund_reason() {
    let deposit = txid(1);
    let tx = receipt(txid(2), &["IPBC", "REFUND", &deposit.to_string(), "TOO_SLOW"]);
    assert_eq!(
      classify_receipt(&tx, &deposit).unwrap_err(),
      ReceiptError::Unrecognized(UnrecognizedFormat::RefundReason("TOO_SLOW".into()))
    );
  }

  #[test]
  fn test_classify_unknown_status() {
    let deposit = txid(1);
    let tx = receipt(txid(2), &["IPBC", "PENDING", &deposit.to_string(), "x"]);
    assert_eq!(
      classify_receipt(&tx, &deposit).unwrap_err(),
      ReceiptError::Unrecognized(UnrecognizedFormat::Receipt(format!(
        "IPBC PENDING {deposit} x"
      )))
    );
  }

  #[test]
  fn test_classify_structural_failures() {
    let deposit = txid(1);
    let id = deposit.to_string();

    assert_eq!(
      classify_receipt(&receipt(txid(2), &["IPBC", "DONE", &id]), &deposit).unwrap_err(),
      ReceiptError::Protocol(ProtocolError::ChunkCount {
        expected: 4,
        actual: 3
      })
    );
    assert_eq!(
      classify_receipt(&receipt(txid(2), &["SLP", "DONE", &id, "x"]), &deposit).unwrap_err(),
      ReceiptError::Protocol(ProtocolError::NotIpbc)
    );
    assert_eq!(
      classify_receipt(
        &receipt(txid(2), &["IPBC", "DONE", &txid(3).to_string(), "x"]),
        &deposit
      )
      .unwrap_err(),
      ReceiptError::Protocol(ProtocolError::CorrelationMismatch(txid(3).to_string()))
    );
    assert_eq!(
      classify_receipt(
        &transaction(txid(2), &[ScriptBuf::from_bytes(vec![0x76, 0xa9])]),
        &deposit
      )
      .unwrap_err(),
      ReceiptError::Protocol(ProtocolError::NoNullData)
    );
    assert!(matches!(
      classify_receipt(
        &transaction(txid(2), &[ScriptBuf::from_bytes(vec![0x6a, 0x05, 0x01])]),
        &deposit
      )
      .unwrap_err(),
      ReceiptError::Protocol(ProtocolError::Malformed(_))
    ));
  }

  #[test]
  fn test_classify_correlation_ignores_case() {
    let deposit = txid(0xab);
    let tx = receipt(
      txid(2),
      &["IPBC", "DONE", &deposit.to_string().to_uppercase(), "bafy"],
    );
    assert!(matches!(
      classify_receipt(&tx, &deposit).unwrap(),
      Settlement::Done(_)
    ));
  }

  #[test]
  fn test_refund_reason_text() {
    assert_eq!("DL_FAIL".parse::<RefundReason>().unwrap(), RefundReason::DlFail);
    assert!("dl_fail".parse::<RefundReason>().is_err());
    assert_eq!(RefundReason::FeeNotPaid.to_string(), "FEE_NOT_PAID");
    assert_eq!(
      serde_json::to_string(&RefundReason::NotIpbc).unwrap(),
      r#""NOT_IPBC""#
    );
    assert_eq!(
      RefundReason::FeeNotPaid.description(&Parameters {
        fee: 250_000,
        max_size: 0
      }),
      "Did not pay required fee - 0.0025 BCH"
    );
  }
}
