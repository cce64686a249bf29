mod feed;
mod session;

pub use self::{
  feed::{FeedEntry, FeedSource},
  session::{Event, Generation, SettlementSession, State, Tagged},
};

use crate::{
  pinning::{protocol::PinRequest, types::WatchedTransaction},
  Result,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::{sync::mpsc, task::JoinHandle};

/// Push notifications of transactions touching an address. Dropping the
/// returned receiver ends the subscription.
#[async_trait]
pub trait TransactionSource: Send + Sync + 'static {
  async fn subscribe(&self, address: &str) -> Result<mpsc::UnboundedReceiver<WatchedTransaction>>;
}

/// Drives a [`SettlementSession`] from deposit and receipt address
/// subscriptions.
///
/// Each watched request runs in its own task that owns its subscriptions.
/// Starting a new request or resetting aborts that task, and the session's
/// generation check discards anything it delivered in between.
pub struct SettlementWatcher<S: TransactionSource> {
  source: Arc<S>,
  deposit_address: String,
  receipt_address: String,
  session: Arc<Mutex<SettlementSession>>,
  events: mpsc::UnboundedSender<Tagged>,
  task: Option<JoinHandle<()>>,
}

impl<S: TransactionSource> SettlementWatcher<S> {
  pub fn new(
    source: Arc<S>,
    deposit_address: impl Into<String>,
    receipt_address: impl Into<String>,
  ) -> (Self, mpsc::UnboundedReceiver<Tagged>) {
    let (events, receiver) = mpsc::unbounded_channel();
    (
      Self {
        source,
        deposit_address: deposit_address.into(),
        receipt_address: receipt_address.into(),
        session: Arc::new(Mutex::new(SettlementSession::new())),
        events,
        task: None,
      },
      receiver,
    )
  }

  pub fn generation(&self) -> Generation {
    lock(&self.session).generation()
  }

  pub fn state(&self) -> State {
    lock(&self.session).state().clone()
  }

  pub fn is_current(&self, generation: Generation) -> bool {
    lock(&self.session).is_current(generation)
  }

  /// Starts watching for the settlement of `request`. Must be called from
  /// within a tokio runtime.
  pub fn watch(&mut self, request: &PinRequest) -> Generation {
    self.abort();
    let generation = lock(&self.session).begin(request);

    let watch = Watch {
      source: self.source.clone(),
      deposit_address: self.deposit_address.clone(),
      receipt_address: self.receipt_address.clone(),
      session: self.session.clone(),
      events: self.events.clone(),
      generation,
    };

    self.task = Some(tokio::spawn(async move {
      if let Err(err) = watch.run().await {
        log::error!("Settlement watch {generation} failed: {err}");
      }
    }));

    generation
  }

  pub fn reset(&mut self) -> Generation {
    self.abort();
    lock(&self.session).reset()
  }

  /// Waits for the current watch to end, either on a terminal event or
  /// because its subscriptions closed.
  pub async fn finished(&mut self) {
    if let Some(task) = self.task.as_mut() {
      if let Err(err) = task.await {
        if err.is_panic() {
          log::error!("Settlement watch panicked: {err}");
        }
      }
      self.task = None;
    }
  }

  fn abort(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

impl<S: TransactionSource> Drop for SettlementWatcher<S> {
  fn drop(&mut self) {
    self.abort();
  }
}

fn lock(session: &Mutex<SettlementSession>) -> MutexGuard<SettlementSession> {
  session.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Watch<S: TransactionSource> {
  source: Arc<S>,
  deposit_address: String,
  receipt_address: String,
  session: Arc<Mutex<SettlementSession>>,
  events: mpsc::UnboundedSender<Tagged>,
  generation: Generation,
}

impl<S: TransactionSource> Watch<S> {
  async fn run(self) -> Result {
    let mut deposits = self.source.subscribe(&self.deposit_address).await?;
    log::debug!(
      "Watch {} subscribed to deposit address {}",
      self.generation,
      self.deposit_address
    );

    loop {
      let tx = match deposits.recv().await {
        Some(tx) => tx,
        None => {
          log::debug!("Deposit subscription of watch {} closed", self.generation);
          return Ok(());
        }
      };

      let event = lock(&self.session).observe_deposit(self.generation, &tx);
      match event {
        Some(event) => {
          if !self.emit(event) {
            return Ok(());
          }
          break;
        }
        None if !self.is_current() => return Ok(()),
        None => {}
      }
    }

    drop(deposits);

    let mut receipts = self.source.subscribe(&self.receipt_address).await?;
    log::debug!(
      "Watch {} subscribed to receipt address {}",
      self.generation,
      self.receipt_address
    );

    while let Some(tx) = receipts.recv().await {
      let event = lock(&self.session).observe_receipt(self.generation, &tx);
      match event {
        Some(event) => {
          let terminal = event.is_terminal();
          if !self.emit(event) || terminal {
            break;
          }
        }
        None if !self.is_current() => break,
        None => {}
      }
    }

    Ok(())
  }

  fn is_current(&self) -> bool {
    lock(&self.session).is_current(self.generation)
  }

  fn emit(&self, event: Event) -> bool {
    self
      .events
      .send(Tagged {
        generation: self.generation,
        event,
      })
      .is_ok()
  }
}
