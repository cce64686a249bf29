#![allow(
  clippy::too_many_arguments,
  clippy::type_complexity,
  clippy::result_large_err
)]
#![deny(
  clippy::cast_lossless,
  clippy::cast_possible_truncation,
  clippy::cast_possible_wrap,
  clippy::cast_sign_loss
)]

use {
  self::{
    arguments::Arguments,
    chain::Chain,
    config::Config,
    pinning::{
      cashaddr,
      protocol::{format_coins, script, Parameters, PinRequest},
      service::{self, gateway_links, Canceller, Pinner, SizeProbe, Uploader},
      types::TokenUtxo,
      watcher::{FeedSource, Generation, SettlementWatcher, State, Tagged},
    },
    options::Options,
    subcommand::{Subcommand, SubcommandResult},
  },
  anyhow::{anyhow, bail, Context, Error},
  bitcoin::Script,
  clap::{ArgGroup, Args, Parser, ValueEnum},
  log::LevelFilter,
  reqwest::Url,
  serde::{Deserialize, Serialize},
  std::{
    env,
    fmt::{self, Display, Formatter},
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    process,
    str::FromStr,
    sync::{
      atomic::{self, AtomicBool},
      Arc, Mutex, PoisonError,
    },
    time::Duration,
  },
  tokio::{
    io::{AsyncBufRead, BufReader},
    runtime::Runtime,
    sync::mpsc,
  },
  tokio_util::sync::CancellationToken,
};

mod arguments;
mod chain;
mod config;
mod logger;
mod options;
pub mod pinning;
pub mod subcommand;

type Result<T = (), E = Error> = std::result::Result<T, E>;

static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);
static LISTENERS: Mutex<Vec<CancellationToken>> = Mutex::new(Vec::new());

/// A token cancelled once the process is asked to shut down.
fn shutdown_token() -> CancellationToken {
  let token = CancellationToken::new();

  if SHUTTING_DOWN.load(atomic::Ordering::Relaxed) {
    token.cancel();
  }

  LISTENERS
    .lock()
    .unwrap_or_else(PoisonError::into_inner)
    .push(token.clone());

  token
}

pub fn main() {
  let args = Arguments::parse();

  let level = match args.options.log_level() {
    Ok(level) => level,
    Err(err) => {
      eprintln!("error: {err}");
      process::exit(2);
    }
  };

  let _logger = match logger::init(level, args.options.log_dir()) {
    Ok(handle) => handle,
    Err(err) => {
      eprintln!("error: failed to initialize logger: {err}");
      process::exit(1);
    }
  };

  if let Err(err) = ctrlc::set_handler(move || {
    if SHUTTING_DOWN.fetch_or(true, atomic::Ordering::Relaxed) {
      process::exit(1);
    }

    eprintln!("Shutting down gracefully. Press <CTRL-C> again to shutdown immediately.");

    LISTENERS
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .iter()
      .for_each(CancellationToken::cancel);
  }) {
    log::warn!("Failed to set <CTRL-C> handler: {err}");
  }

  match args.run() {
    Err(err) => {
      eprintln!("error: {err}");
      err
        .chain()
        .skip(1)
        .for_each(|cause| eprintln!("because: {cause}"));
      if env::var_os("RUST_BACKTRACE")
        .map(|val| val == "1")
        .unwrap_or_default()
      {
        eprintln!("{}", err.backtrace());
      }

      process::exit(1);
    }
    Ok(output) => output.print_json(),
  }
}
