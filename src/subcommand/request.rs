use super::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub url: String,
  pub deposit_address: String,
  pub fee: u32,
  pub amount: String,
  pub op_return_raw: String,
  pub pay_instruction: String,
}

impl Output {
  pub(crate) fn new(request: &PinRequest, deposit_address: String) -> Self {
    Self {
      url: request.url.clone(),
      deposit_address,
      fee: request.fee_sats,
      amount: format_coins(request.fee_amount()),
      op_return_raw: request.op_return_raw(),
      pay_instruction: request.pay_instruction.clone(),
    }
  }
}

#[derive(Debug, Parser)]
pub(crate) struct Request {
  #[arg(help = "Pin the content at <URL>.")]
  url: String,
  #[arg(long, help = "Check the remote content size with a HEAD request first.")]
  probe: bool,
  #[arg(
    long,
    default_value = "0",
    help = "Wait <DEBOUNCE> milliseconds before validating."
  )]
  debounce: u64,
  #[command(flatten)]
  parameters: ParameterSource,
}

impl Request {
  pub(crate) fn run(self, options: Options) -> SubcommandResult {
    let config = options.load_config()?;
    let chain = options.chain(&config);
    let parameters = self.parameters.resolve(chain, &config)?;
    let deposit_address = options.deposit_address(&config)?;
    let receipt_address = options.receipt_address(&config)?;

    let request = runtime()?.block_on(async {
      // nothing is fed to the watcher, the request is only printed
      let (watcher, _events) = SettlementWatcher::new(
        Arc::new(FeedSource::new()),
        deposit_address.clone(),
        receipt_address,
      );

      let mut pinner = Pinner::new(deposit_address.clone(), parameters, watcher)
        .with_debounce(Duration::from_millis(self.debounce));

      if self.probe {
        pinner = pinner.with_probe(SizeProbe::new(options.probe_timeout())?);
      }

      cancel_on_shutdown(pinner.canceller());

      let (_, request) = pinner.prepare(&self.url).await?;

      anyhow::Ok(request)
    })?;

    Ok(Box::new(Output::new(&request, deposit_address)))
  }
}
