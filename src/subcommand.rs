use super::*;

pub mod decode;
pub mod encode;
pub mod params;
pub mod request;
pub mod upload;
pub mod watch;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
  #[command(about = "Encode chunks into a null-data script")]
  Encode(encode::Encode),
  #[command(about = "Decode the chunks of a null-data script")]
  Decode(decode::Decode),
  #[command(about = "Resolve service parameters from token holdings")]
  Params(params::Params),
  #[command(about = "Validate a URL and build its pin request")]
  Request(request::Request),
  #[command(about = "Upload a file or text to the hosting service")]
  Upload(upload::Upload),
  #[command(about = "Build a pin request and follow its settlement")]
  Watch(watch::Watch),
}

impl Subcommand {
  pub(crate) fn run(self, options: Options) -> SubcommandResult {
    match self {
      Self::Encode(encode) => encode.run(),
      Self::Decode(decode) => decode.run(),
      Self::Params(params) => params.run(options),
      Self::Request(request) => request.run(options),
      Self::Upload(upload) => upload.run(options),
      Self::Watch(watch) => watch.run(options),
    }
  }
}

/// Where the service parameters come from: token holdings take precedence
/// over explicit values, which take precedence over the config file.
#[derive(Debug, Default, Args)]
pub(crate) struct ParameterSource {
  #[arg(
    long,
    help = "Resolve parameters from token holdings in <HOLDINGS>, a JSON array of unspent outputs. Use `-` for stdin."
  )]
  pub(crate) holdings: Option<PathBuf>,
  #[arg(long, requires = "max_size", help = "Charge <FEE> satoshis.")]
  pub(crate) fee: Option<u32>,
  #[arg(long, requires = "fee", help = "Accept at most <MAX_SIZE> bytes.")]
  pub(crate) max_size: Option<u32>,
}

impl ParameterSource {
  pub(crate) fn resolve(&self, chain: Chain, config: &Config) -> Result<Parameters> {
    if let Some(path) = &self.holdings {
      return resolve_holdings(&read_holdings(path)?, chain);
    }

    if let (Some(fee), Some(max_size)) = (self.fee, self.max_size) {
      return Ok(Parameters { fee, max_size });
    }

    config
      .parameters
      .ok_or_else(|| anyhow!("no service parameters: pass --holdings, or --fee and --max-size"))
  }
}

pub(crate) fn read_holdings(path: &Path) -> Result<Vec<TokenUtxo>> {
  let json = if path == Path::new("-") {
    io::read_to_string(io::stdin()).context("failed to read holdings from stdin")?
  } else {
    fs::read_to_string(path)
      .with_context(|| format!("failed to read holdings {}", path.display()))?
  };

  serde_json::from_str(&json).context("failed to parse holdings")
}

/// Resolves parameters from the holdings of the chain's parameter token.
pub(crate) fn resolve_holdings(holdings: &[TokenUtxo], chain: Chain) -> Result<Parameters> {
  let category = chain.parameter_token();

  let holdings = holdings
    .iter()
    .filter(|utxo| utxo.category() == Some(category))
    .cloned()
    .collect::<Vec<TokenUtxo>>();

  let mut parameters = Parameters::default();
  if !parameters.update(&holdings) {
    bail!("no parameter commitment found for token {category}");
  }

  Ok(parameters)
}

pub(crate) fn runtime() -> Result<Runtime> {
  Runtime::new().context("failed to start async runtime")
}

/// Cancels `canceller` when the process is asked to shut down.
pub(crate) fn cancel_on_shutdown(canceller: Canceller) {
  let shutdown = shutdown_token();
  tokio::spawn(async move {
    shutdown.cancelled().await;
    canceller.cancel();
  });
}

pub trait Output: Send {
  fn print_json(&self);
}

impl<T> Output for T
where
  T: Serialize + Send,
{
  fn print_json(&self) {
    serde_json::to_writer_pretty(io::stdout(), self).ok();
    println!();
  }
}

pub(crate) type SubcommandResult = Result<Box<dyn Output>>;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pinning::types::{Nft, NftCapability, TokenData};

  fn utxo(category: &str, commitment: &str) -> TokenUtxo {
    TokenUtxo {
      txid: "11".repeat(32).parse().unwrap(),
      vout: 0,
      height: 800_000,
      value: 1000,
      token_data: Some(TokenData {
        category: category.into(),
        amount: "0".into(),
        nft: Some(Nft {
          capability: NftCapability::Mutable,
          commitment: commitment.into(),
        }),
      }),
    }
  }

  #[test]
  fn holdings_are_filtered_by_parameter_token() {
    let holdings = [
      utxo(&"ab".repeat(32), "ffffffffffffffff"),
      utxo(Chain::Mainnet.parameter_token(), "0100000000400000"),
    ];

    assert_eq!(
      resolve_holdings(&holdings, Chain::Mainnet).unwrap(),
      Parameters {
        fee: 1,
        max_size: 16384
      }
    );
    assert_eq!(
      resolve_holdings(&holdings, Chain::Testnet)
        .unwrap_err()
        .to_string(),
      format!(
        "no parameter commitment found for token {}",
        Chain::Testnet.parameter_token()
      )
    );
  }

  #[test]
  fn parameter_source_precedence() {
    let config = Config {
      parameters: Some(Parameters {
        fee: 5,
        max_size: 6,
      }),
      ..Default::default()
    };

    assert_eq!(
      ParameterSource::default()
        .resolve(Chain::Mainnet, &config)
        .unwrap(),
      Parameters {
        fee: 5,
        max_size: 6
      }
    );

    assert_eq!(
      ParameterSource {
        fee: Some(1),
        max_size: Some(2),
        ..Default::default()
      }
      .resolve(Chain::Mainnet, &config)
      .unwrap(),
      Parameters {
        fee: 1,
        max_size: 2
      }
    );

    assert!(ParameterSource::default()
      .resolve(Chain::Mainnet, &Config::default())
      .is_err());
  }
}
