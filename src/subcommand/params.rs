use super::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub chain: Chain,
  pub parameter_token: String,
  pub fee: u32,
  pub fee_bch: String,
  pub max_size: u32,
}

#[derive(Debug, Parser)]
pub(crate) struct Params {
  #[arg(
    long,
    default_value = "-",
    help = "Read token holdings from <HOLDINGS>, a JSON array of unspent outputs. Defaults to stdin."
  )]
  holdings: PathBuf,
}

impl Params {
  pub(crate) fn run(self, options: Options) -> SubcommandResult {
    let config = options.load_config()?;
    let chain = options.chain(&config);

    let parameters = resolve_holdings(&read_holdings(&self.holdings)?, chain)?;

    Ok(Box::new(Output {
      chain,
      parameter_token: chain.parameter_token().into(),
      fee: parameters.fee,
      fee_bch: parameters.fee_coins(),
      max_size: parameters.max_size,
    }))
  }
}
