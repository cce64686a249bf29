use super::probe::SizeProbe;
use crate::pinning::{
  protocol::{
    validate, validate_url, Error, NetworkError, Parameters, Payload, PinRequest,
    PinRequestBuilder,
  },
  types::TokenUtxo,
  watcher::{Generation, SettlementWatcher, State, TransactionSource},
};
use std::{
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};
use tokio_util::sync::CancellationToken;

/// Cancels whatever validation the [`Pinner`] currently has in flight.
#[derive(Debug, Clone, Default)]
pub struct Canceller(Arc<Mutex<CancellationToken>>);

impl Canceller {
  pub fn cancel(&self) {
    self.lock().cancel();
  }

  /// Cancels the in-flight token and installs a fresh one for the next
  /// request.
  fn renew(&self) -> CancellationToken {
    let mut token = self.lock();
    token.cancel();
    *token = CancellationToken::new();
    token.clone()
  }

  fn lock(&self) -> MutexGuard<CancellationToken> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Ties request validation, construction and settlement watching together.
///
/// Every call to [`Pinner::prepare`] supersedes the previous request: its
/// pending validation is cancelled and its settlement watch discarded.
pub struct Pinner<S: TransactionSource> {
  builder: PinRequestBuilder,
  deposit_address: String,
  probe: Option<SizeProbe>,
  debounce: Duration,
  canceller: Canceller,
  watcher: SettlementWatcher<S>,
}

impl<S: TransactionSource> Pinner<S> {
  pub fn new(
    deposit_address: impl Into<String>,
    parameters: Parameters,
    watcher: SettlementWatcher<S>,
  ) -> Self {
    let deposit_address = deposit_address.into();
    Self {
      builder: PinRequestBuilder::new(deposit_address.clone(), parameters),
      deposit_address,
      probe: None,
      debounce: Duration::ZERO,
      canceller: Canceller::default(),
      watcher,
    }
  }

  pub fn with_probe(mut self, probe: SizeProbe) -> Self {
    self.probe = Some(probe);
    self
  }

  pub fn with_debounce(mut self, debounce: Duration) -> Self {
    self.debounce = debounce;
    self
  }

  pub fn parameters(&self) -> Parameters {
    self.builder.parameters()
  }

  /// Applies freshly queried token holdings. Unresolvable holdings keep the
  /// current parameters.
  pub fn update_parameters(&mut self, holdings: &[TokenUtxo]) -> bool {
    let mut parameters = self.parameters();
    if !parameters.update(holdings) {
      return false;
    }
    self.builder = PinRequestBuilder::new(self.deposit_address.clone(), parameters);
    true
  }

  pub fn canceller(&self) -> Canceller {
    self.canceller.clone()
  }

  pub fn watcher(&self) -> &SettlementWatcher<S> {
    &self.watcher
  }

  pub fn state(&self) -> State {
    self.watcher.state()
  }

  /// Validates `url`, waits out the debounce, checks the remote size when a
  /// probe is configured, then builds the request and starts watching for its
  /// deposit.
  ///
  /// A remote size above the limit fails the request. An unknown remote size
  /// is accepted.
  ///
  /// `prepare` borrows the pinner mutably, so calls never overlap. A request
  /// that supersedes one still in flight first cancels it through
  /// [`Pinner::canceller`] from another task, then calls `prepare` again once
  /// the pending call has returned [`NetworkError::Cancelled`].
  pub async fn prepare(&mut self, url: &str) -> Result<(Generation, PinRequest), Error> {
    let token = self.canceller.renew();
    self.watcher.reset();

    let parsed = validate_url(url)?;

    if !self.debounce.is_zero() {
      tokio::select! {
        biased;
        _ = token.cancelled() => return Err(NetworkError::Cancelled.into()),
        _ = tokio::time::sleep(self.debounce) => {}
      }
    }

    if let Some(probe) = &self.probe {
      if let Some(size) = probe.probe(&parsed, &token).await? {
        validate(Payload::Url(url), size, self.parameters().max_size)?;
      }
    }

    if token.is_cancelled() {
      return Err(NetworkError::Cancelled.into());
    }

    let request = self.builder.build(url)?;
    let generation = self.watcher.watch(&request);

    log::info!(
      "Request {generation} for {url}: pay {}",
      request.pay_instruction
    );

    Ok((generation, request))
  }

  pub fn reset(&mut self) -> Generation {
    self.canceller.renew();
    self.watcher.reset()
  }

  pub async fn finished(&mut self) {
    self.watcher.finished().await;
  }
}
