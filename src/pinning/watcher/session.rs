use crate::pinning::{
  custom_serde::{ScriptHexSerde, TxidSerde},
  protocol::{
    classify_receipt, DepositEvent, PinRequest, ReceiptError, ReceiptEvent, RefundReason,
    Settlement, UnrecognizedFormat,
  },
  types::WatchedTransaction,
};
use bitcoin::{ScriptBuf, Txid};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Tag of one watch attempt. Anything carrying an older generation than the
/// session's current one is stale.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Generation(u64);

impl Generation {
  fn next(self) -> Self {
    Self(self.0 + 1)
  }
}

impl Display for Generation {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum State {
  #[default]
  Idle,
  AwaitingDeposit {
    #[serde(with = "ScriptHexSerde")]
    expected_script: ScriptBuf,
  },
  AwaitingReceipt {
    deposit: DepositEvent,
  },
  Settled {
    deposit: DepositEvent,
    receipt: ReceiptEvent,
  },
  Refunded {
    deposit: DepositEvent,
    receipt: ReceiptEvent,
    reason: RefundReason,
  },
}

impl State {
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Settled { .. } | Self::Refunded { .. })
  }

  pub fn deposit(&self) -> Option<&DepositEvent> {
    match self {
      Self::Idle | Self::AwaitingDeposit { .. } => None,
      Self::AwaitingReceipt { deposit }
      | Self::Settled { deposit, .. }
      | Self::Refunded { deposit, .. } => Some(deposit),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
  DepositDetected(DepositEvent),
  Settled(ReceiptEvent),
  Refunded {
    receipt: ReceiptEvent,
    reason: RefundReason,
  },
  /// A receipt for the watched deposit that could not be understood. The
  /// session keeps waiting.
  Unrecognized {
    #[serde(with = "TxidSerde")]
    txid: Txid,
    warning: UnrecognizedFormat,
  },
}

impl Event {
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Settled(_) | Self::Refunded { .. })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tagged {
  pub generation: Generation,
  #[serde(flatten)]
  pub event: Event,
}

/// Correlation state for the current pin request.
#[derive(Debug, Default)]
pub struct SettlementSession {
  generation: Generation,
  state: State,
}

impl SettlementSession {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn generation(&self) -> Generation {
    self.generation
  }

  pub fn state(&self) -> &State {
    &self.state
  }

  pub fn is_current(&self, generation: Generation) -> bool {
    self.generation == generation
  }

  /// Starts watching for the deposit paying `request`, superseding any
  /// previous request.
  pub fn begin(&mut self, request: &PinRequest) -> Generation {
    self.generation = self.generation.next();
    self.state = State::AwaitingDeposit {
      expected_script: request.encoded.clone(),
    };
    log::info!(
      "Session {} awaiting deposit for {}",
      self.generation,
      request.url
    );
    self.generation
  }

  pub fn reset(&mut self) -> Generation {
    self.generation = self.generation.next();
    self.state = State::Idle;
    log::debug!("Session reset to {}", self.generation);
    self.generation
  }

  /// Handles a transaction seen on the deposit address.
  pub fn observe_deposit(
    &mut self,
    generation: Generation,
    tx: &WatchedTransaction,
  ) -> Option<Event> {
    if !self.is_current(generation) {
      log::debug!(
        "Dropping deposit notification {} of stale session {generation}",
        tx.txid
      );
      return None;
    }

    let expected_script = match &self.state {
      State::AwaitingDeposit { expected_script } => expected_script,
      _ => return None,
    };

    if !tx.has_output_script(expected_script) {
      log::debug!("Transaction {} is not the awaited deposit", tx.txid);
      return None;
    }

    let deposit = DepositEvent {
      txid: tx.txid,
      matched_script: expected_script.clone(),
    };
    log::info!("Session {} detected deposit {}", self.generation, tx.txid);
    self.state = State::AwaitingReceipt {
      deposit: deposit.clone(),
    };

    Some(Event::DepositDetected(deposit))
  }

  /// Handles a transaction seen on the receipt address.
  pub fn observe_receipt(
    &mut self,
    generation: Generation,
    tx: &WatchedTransaction,
  ) -> Option<Event> {
    if !self.is_current(generation) {
      log::debug!(
        "Dropping receipt notification {} of stale session {generation}",
        tx.txid
      );
      return None;
    }

    let deposit = match &self.state {
      State::AwaitingReceipt { deposit } => deposit.clone(),
      _ => return None,
    };

    match classify_receipt(tx, &deposit.txid) {
      Ok(Settlement::Done(receipt)) => {
        log::info!(
          "Deposit {} settled by {}: {}",
          deposit.txid,
          receipt.txid,
          receipt.payload_text()
        );
        self.state = State::Settled {
          deposit,
          receipt: receipt.clone(),
        };
        Some(Event::Settled(receipt))
      }
      Ok(Settlement::Refund { receipt, reason }) => {
        log::info!(
          "Deposit {} refunded by {}: {reason}",
          deposit.txid,
          receipt.txid
        );
        self.state = State::Refunded {
          deposit,
          receipt: receipt.clone(),
          reason,
        };
        Some(Event::Refunded { receipt, reason })
      }
      Err(ReceiptError::Protocol(err)) => {
        log::debug!("Ignoring transaction {} on receipt address: {err}", tx.txid);
        None
      }
      Err(ReceiptError::Unrecognized(warning)) => {
        log::warn!("Receipt {} for deposit {}: {warning}", tx.txid, deposit.txid);
        Some(Event::Unrecognized {
          txid: tx.txid,
          warning,
        })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pinning::protocol::{
    receipt::tests::{receipt, transaction, txid},
    Parameters, PinRequestBuilder, ReceiptStatus,
  };

  fn request(url: &str) -> PinRequest {
    PinRequestBuilder::new(
      "bitcoincash:qrsl56haj6kcw7v7lw9kzuh89v74maemqsq8h4rfqy",
      Parameters {
        fee: 250_000,
        max_size: 1000,
      },
    )
    .build(url)
    .unwrap()
  }

  fn deposit_tx(n: u8, request: &PinRequest) -> WatchedTransaction {
    transaction(
      txid(n),
      &[
        ScriptBuf::from_bytes(vec![0x76, 0xa9, 0x14]),
        request.encoded.clone(),
      ],
    )
  }

  fn awaiting_receipt() -> (SettlementSession, Generation, Txid) {
    let mut session = SettlementSession::new();
    let request = request("https://example.com/a.json");
    let generation = session.begin(&request);
    session
      .observe_deposit(generation, &deposit_tx(1, &request))
      .unwrap();
    (session, generation, txid(1))
  }

  #[test]
  fn test_begin_awaits_deposit() {
    let mut session = SettlementSession::new();
    assert_eq!(session.state(), &State::Idle);

    let request = request("https://example.com/a.json");
    let generation = session.begin(&request);
    assert!(session.is_current(generation));
    assert_eq!(
      session.state(),
      &State::AwaitingDeposit {
        expected_script: request.encoded.clone()
      }
    );
  }

  #[test]
  fn test_unrelated_deposit_is_ignored() {
    let mut session = SettlementSession::new();
    let generation = session.begin(&request("https://example.com/a.json"));

    let other = request("https://example.com/b.json");
    assert_eq!(session.observe_deposit(generation, &deposit_tx(1, &other)), None);
    assert!(matches!(session.state(), State::AwaitingDeposit { .. }));
  }

  #[test]
  fn test_matching_deposit_is_detected_once() {
    let mut session = SettlementSession::new();
    let request = request("https://example.com/a.json");
    let generation = session.begin(&request);

    assert_eq!(
      session.observe_deposit(generation, &deposit_tx(1, &request)),
      Some(Event::DepositDetected(DepositEvent {
        txid: txid(1),
        matched_script: request.encoded.clone(),
      }))
    );
    assert_eq!(session.state().deposit().unwrap().txid, txid(1));

    assert_eq!(session.observe_deposit(generation, &deposit_tx(1, &request)), None);
    assert_eq!(session.observe_deposit(generation, &deposit_tx(9, &request)), None);
    assert_eq!(session.state().deposit().unwrap().txid, txid(1));
  }

  #[test]
  fn test_done_receipt_settles() {
    let (mut session, generation, deposit) = awaiting_receipt();

    let event = session
      .observe_receipt(
        generation,
        &receipt(txid(2), &["IPBC", "DONE", &deposit.to_string(), "bafy..."]),
      )
      .unwrap();

    match &event {
      Event::Settled(receipt) => {
        assert_eq!(receipt.status, ReceiptStatus::Done);
        assert_eq!(receipt.payload_text(), "bafy...");
      }
      other => panic!("unexpected event {other:?}"),
    }
    assert!(event.is_terminal());
    assert!(session.state().is_terminal());
    assert!(matches!(session.state(), State::Settled { .. }));
  }

  #[test]
  fn test_refund_receipt_refunds() {
    let (mut session, generation, deposit) = awaiting_receipt();

    let event = session.observe_receipt(
      generation,
      &receipt(
        txid(2),
        &["IPBC", "REFUND", &deposit.to_string(), "FEE_NOT_PAID"],
      ),
    );

    assert!(matches!(
      event,
      Some(Event::Refunded {
        reason: RefundReason::FeeNotPaid,
        ..
      })
    ));
    assert!(matches!(
      session.state(),
      State::Refunded {
        reason: RefundReason::FeeNotPaid,
        ..
      }
    ));
  }

  #[test]
  fn test_receipt_for_other_deposit_is_ignored() {
    let (mut session, generation, _) = awaiting_receipt();

    assert_eq!(
      session.observe_receipt(
        generation,
        &receipt(txid(2), &["IPBC", "DONE", &txid(7).to_string(), "bafy..."]),
      ),
      None
    );
    assert!(matches!(session.state(), State::AwaitingReceipt { .. }));
  }

  #[test]
  fn test_unrecognized_receipt_keeps_waiting() {
    let (mut session, generation, deposit) = awaiting_receipt();

    assert_eq!(
      session.observe_receipt(
        generation,
        &receipt(txid(2), &["IPBC", "REFUND", &deposit.to_string(), "WHO_KNOWS"]),
      ),
      Some(Event::Unrecognized {
        txid: txid(2),
        warning: UnrecognizedFormat::RefundReason("WHO_KNOWS".into()),
      })
    );
    assert!(matches!(session.state(), State::AwaitingReceipt { .. }));

    assert!(matches!(
      session.observe_receipt(
        generation,
        &receipt(txid(3), &["IPBC", "DONE", &deposit.to_string(), "bafy"]),
      ),
      Some(Event::Settled(_))
    ));
  }

  #[test]
  fn test_receipt_before_deposit_is_ignored() {
    let mut session = SettlementSession::new();
    let generation = session.begin(&request("https://example.com/a.json"));

    assert_eq!(
      session.observe_receipt(
        generation,
        &receipt(txid(2), &["IPBC", "DONE", &txid(1).to_string(), "bafy"]),
      ),
      None
    );
  }

  #[test]
  fn test_settled_session_ignores_later_receipts() {
    let (mut session, generation, deposit) = awaiting_receipt();
    let id = deposit.to_string();

    session
      .observe_receipt(generation, &receipt(txid(2), &["IPBC", "DONE", &id, "bafy"]))
      .unwrap();
    assert_eq!(
      session.observe_receipt(
        generation,
        &receipt(txid(3), &["IPBC", "REFUND", &id, "DL_FAIL"])
      ),
      None
    );
    assert!(matches!(session.state(), State::Settled { .. }));
  }

  #[test]
  fn test_stale_generation_is_discarded() {
    let mut session = SettlementSession::new();
    let old_request = request("https://example.com/old.json");
    let old = session.begin(&old_request);

    let new_request = request("https://example.com/new.json");
    let new = session.begin(&new_request);
    assert!(new > old);
    assert!(!session.is_current(old));

    assert_eq!(session.observe_deposit(old, &deposit_tx(1, &new_request)), None);
    assert!(matches!(session.state(), State::AwaitingDeposit { .. }));

    assert!(session
      .observe_deposit(new, &deposit_tx(1, &new_request))
      .is_some());
    assert_eq!(
      session.observe_receipt(
        old,
        &receipt(txid(2), &["IPBC", "DONE", &txid(1).to_string(), "bafy"]),
      ),
      None
    );
    assert!(matches!(session.state(), State::AwaitingReceipt { .. }));
  }

  #[test]
  fn test_reset_clears_recorded_events() {
    let (mut session, generation, _) = awaiting_receipt();
    let next = session.reset();

    assert_ne!(next, generation);
    assert_eq!(session.state(), &State::Idle);
    assert_eq!(session.state().deposit(), None);
  }

  #[test]
  fn test_event_serialization() {
    let tagged = Tagged {
      generation: Generation(3),
      event: Event::Refunded {
        receipt: ReceiptEvent {
          txid: txid(2),
          status: ReceiptStatus::Refund,
          correlation_id: txid(1).to_string(),
          payload: b"DL_FAIL".to_vec(),
        },
        reason: RefundReason::DlFail,
      },
    };

    let value = serde_json::to_value(&tagged).unwrap();
    assert_eq!(value["generation"], 3);
    assert_eq!(value["event"], "refunded");
    assert_eq!(value["reason"], "DL_FAIL");
    assert_eq!(value["receipt"]["status"], "REFUND");
    assert_eq!(value["receipt"]["payload"], hex::encode("DL_FAIL"));
  }
}
