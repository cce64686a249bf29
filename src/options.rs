use super::*;

#[derive(Clone, Default, Debug, Parser)]
#[clap(group(
  ArgGroup::new("chains")
    .required(false)
    .args(&["chain_argument", "testnet"]),
))]
pub(crate) struct Options {
  #[arg(long = "chain", value_enum, help = "Use <CHAIN>. [default: mainnet]")]
  pub(crate) chain_argument: Option<Chain>,
  #[arg(long, short, help = "Use testnet. Equivalent to `--chain testnet`.")]
  pub(crate) testnet: bool,
  #[arg(
    long,
    help = "Load configuration from <CONFIG>. [default: <CONFIG_DIR>/ipbc/ipbc.yaml, if present]"
  )]
  pub(crate) config: Option<PathBuf>,
  #[arg(long, help = "Send pin request payments to <DEPOSIT_ADDRESS>.")]
  pub(crate) deposit_address: Option<String>,
  #[arg(long, help = "Expect receipts from <RECEIPT_ADDRESS>.")]
  pub(crate) receipt_address: Option<String>,
  #[arg(long, help = "Upload files to <UPLOAD_URL>.")]
  pub(crate) upload_url: Option<String>,
  #[arg(long, help = "Link pinned content on <GATEWAY>.")]
  pub(crate) gateway: Option<String>,
  #[arg(
    long,
    default_value = "10000",
    help = "Give up probing remote content after <PROBE_TIMEOUT> milliseconds."
  )]
  pub(crate) probe_timeout: u64,
  #[arg(
    long,
    default_value = "info",
    help = "Log at <LOG_LEVEL>: off, error, warn, info, debug or trace."
  )]
  pub(crate) log_level: String,
  #[arg(long, help = "Also write rolling log files to <LOG_DIR>.")]
  pub(crate) log_dir: Option<PathBuf>,
}

impl Options {
  pub(crate) fn load_config(&self) -> Result<Config> {
    if let Some(path) = &self.config {
      return Config::load(path);
    }

    match Self::default_config_path() {
      Some(path) if path.is_file() => {
        log::debug!("Loading default config {}", path.display());
        Config::load(&path)
      }
      _ => Ok(Default::default()),
    }
  }

  fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ipbc").join("ipbc.yaml"))
  }

  pub(crate) fn chain(&self, config: &Config) -> Chain {
    if self.testnet {
      Chain::Testnet
    } else {
      self
        .chain_argument
        .or(config.chain)
        .unwrap_or_default()
    }
  }

  pub(crate) fn deposit_address(&self, config: &Config) -> Result<String> {
    let chain = self.chain(config);
    match self
      .deposit_address
      .as_ref()
      .or(config.deposit_address.as_ref())
    {
      Some(address) => chain.address(address),
      None => chain.deposit_address(),
    }
  }

  pub(crate) fn receipt_address(&self, config: &Config) -> Result<String> {
    let chain = self.chain(config);
    match self
      .receipt_address
      .as_ref()
      .or(config.receipt_address.as_ref())
    {
      Some(address) => chain.address(address),
      None => chain.receipt_address(),
    }
  }

  pub(crate) fn upload_url(&self, config: &Config) -> Result<Url> {
    let url = self
      .upload_url
      .clone()
      .or_else(|| config.upload_url.clone())
      .unwrap_or_else(|| self.chain(config).upload_url().into());

    Url::parse(&url).with_context(|| format!("invalid upload url `{url}`"))
  }

  pub(crate) fn gateway(&self, config: &Config) -> String {
    self
      .gateway
      .clone()
      .or_else(|| config.gateway.clone())
      .unwrap_or_else(|| self.chain(config).gateway().into())
  }

  pub(crate) fn probe_timeout(&self) -> Duration {
    Duration::from_millis(self.probe_timeout)
  }

  pub(crate) fn log_level(&self) -> Result<LevelFilter> {
    LevelFilter::from_str(&self.log_level)
      .map_err(|_| anyhow!("invalid log level `{}`", self.log_level))
  }

  pub(crate) fn log_dir(&self) -> Option<&Path> {
    self.log_dir.as_deref()
  }
}
