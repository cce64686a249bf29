use super::TransactionSource;
use crate::{
  pinning::{cashaddr::CashAddress, types::WatchedTransaction},
  Result,
};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
  collections::{HashMap, VecDeque},
  sync::{Mutex, MutexGuard, PoisonError},
};
use tokio::{
  io::{AsyncBufRead, AsyncBufReadExt},
  sync::mpsc,
};
use tokio_stream::{wrappers::LinesStream, StreamExt};

/// One line of a transaction feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedEntry {
  pub address: String,
  pub tx: WatchedTransaction,
}

/// Transactions kept per address for replay.
const DEFAULT_BACKLOG_LIMIT: usize = 4096;

#[derive(Default)]
struct Feed {
  backlog: VecDeque<WatchedTransaction>,
  subscribers: Vec<mpsc::UnboundedSender<WatchedTransaction>>,
}

struct Inner {
  feeds: HashMap<String, Feed>,
  backlog_limit: usize,
  closed: bool,
}

/// A [`TransactionSource`] fed by JSON lines of [`FeedEntry`].
///
/// The most recent transactions seen for an address, up to the backlog
/// limit, are kept and replayed to later subscribers, so a subscription
/// opened after a transaction arrived still observes it. Older ones are
/// dropped, which bounds memory on long-running feeds.
pub struct FeedSource {
  inner: Mutex<Inner>,
}

impl Default for FeedSource {
  fn default() -> Self {
    Self::with_backlog_limit(DEFAULT_BACKLOG_LIMIT)
  }
}

impl FeedSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_backlog_limit(backlog_limit: usize) -> Self {
    Self {
      inner: Mutex::new(Inner {
        feeds: HashMap::new(),
        backlog_limit,
        closed: false,
      }),
    }
  }

  /// Feeds are keyed by canonical cash address, so `bitcoincash:q...` and
  /// `q...` name the same feed. Anything else is kept verbatim.
  fn key(address: &str) -> String {
    address
      .parse::<CashAddress>()
      .map(|address| address.to_string())
      .unwrap_or_else(|_| address.to_string())
  }

  fn lock(&self) -> MutexGuard<Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn push(&self, entry: FeedEntry) {
    let mut inner = self.lock();
    if inner.closed {
      log::debug!("Feed closed, dropping {}", entry.tx.txid);
      return;
    }

    let limit = inner.backlog_limit;
    let feed = inner.feeds.entry(Self::key(&entry.address)).or_default();
    feed
      .subscribers
      .retain(|subscriber| subscriber.send(entry.tx.clone()).is_ok());
    feed.backlog.push_back(entry.tx);
    while feed.backlog.len() > limit {
      feed.backlog.pop_front();
    }
  }

  /// Ends every subscription once its backlog is drained.
  pub fn close(&self) {
    let mut inner = self.lock();
    inner.closed = true;
    for feed in inner.feeds.values_mut() {
      feed.subscribers.clear();
    }
  }

  /// Reads entries from `reader` until end of input, then closes the feed.
  /// Blank lines are skipped.
  pub async fn pump<R: AsyncBufRead + Unpin>(&self, reader: R) -> Result {
    let mut lines = LinesStream::new(reader.lines());
    let mut number = 0usize;

    let result = async {
      while let Some(line) = lines.next().await {
        number += 1;
        let line = line.context("failed to read transaction feed")?;
        if line.trim().is_empty() {
          continue;
        }

        let entry = serde_json::from_str::<FeedEntry>(&line)
          .with_context(|| format!("invalid transaction feed entry on line {number}"))?;

        log::debug!("Feed line {number}: {} for {}", entry.tx.txid, entry.address);
        self.push(entry);
      }
      Ok::<(), anyhow::Error>(())
    }
    .await;

    self.close();
    result
  }
}

#[async_trait]
impl TransactionSource for FeedSource {
  async fn subscribe(&self, address: &str) -> Result<mpsc::UnboundedReceiver<WatchedTransaction>> {
    let (sender, receiver) = mpsc::unbounded_channel();

    let mut inner = self.lock();
    let closed = inner.closed;
    let feed = inner.feeds.entry(Self::key(address)).or_default();

    for tx in &feed.backlog {
      // the receiver is still in scope
      let _ = sender.send(tx.clone());
    }

    if !closed {
      feed.subscribers.push(sender);
    }

    Ok(receiver)
  }
}
