use super::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub request: request::Output,
  pub state: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub deposit: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub receipt: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cid: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub links: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub refund: Option<String>,
}

#[derive(Debug, Parser)]
pub(crate) struct Watch {
  #[arg(help = "Pin the content at <URL>.")]
  url: String,
  #[arg(
    long,
    help = "Read JSON lines of `{\"address\": ..., \"tx\": ...}` from <FEED>. Defaults to stdin."
  )]
  feed: Option<PathBuf>,
  #[command(flatten)]
  parameters: ParameterSource,
}

enum Stop {
  Shutdown,
  Terminal,
  FeedEnded(Result),
}

impl Watch {
  pub(crate) fn run(self, options: Options) -> SubcommandResult {
    let config = options.load_config()?;
    let chain = options.chain(&config);
    let parameters = self.parameters.resolve(chain, &config)?;
    let deposit_address = options.deposit_address(&config)?;
    let receipt_address = options.receipt_address(&config)?;
    let gateway = options.gateway(&config);

    let (request, state) = runtime()?.block_on(async {
      let source = Arc::new(FeedSource::new());
      let (watcher, mut events) = SettlementWatcher::new(
        source.clone(),
        deposit_address.clone(),
        receipt_address.clone(),
      );
      let mut pinner = Pinner::new(deposit_address.clone(), parameters, watcher);

      let (generation, request) = pinner.prepare(&self.url).await?;
      log::info!(
        "Watching {deposit_address} for the deposit and {receipt_address} for the receipt"
      );

      let reader: Box<dyn AsyncBufRead + Send + Unpin> = match &self.feed {
        Some(path) => Box::new(BufReader::new(
          tokio::fs::File::open(path)
            .await
            .with_context(|| format!("failed to open feed {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(tokio::io::stdin())),
      };

      let pump = tokio::spawn({
        let source = source.clone();
        async move { source.pump(reader).await }
      });

      let shutdown = shutdown_token();

      let stop = tokio::select! {
        _ = shutdown.cancelled() => Stop::Shutdown,
        () = follow(&mut events, generation) => Stop::Terminal,
        result = async {
          let result = match pump.await {
            Ok(result) => result,
            Err(err) => Err(anyhow!("feed reader failed: {err}")),
          };
          pinner.finished().await;
          result
        } => Stop::FeedEnded(result),
      };

      match stop {
        Stop::Shutdown => log::info!("Stopped watching"),
        Stop::Terminal => {}
        Stop::FeedEnded(result) => {
          while let Ok(tagged) = events.try_recv() {
            print_event(&tagged, generation);
          }
          result?;
          if !pinner.state().is_terminal() {
            log::warn!("Transaction feed ended before the request settled");
          }
        }
      }

      anyhow::Ok((request, pinner.state()))
    })?;

    Ok(Box::new(Output::new(
      request::Output::new(&request, deposit_address),
      state,
      &parameters,
      &gateway,
    )))
  }
}

/// Prints events of `generation` until a terminal one.
async fn follow(events: &mut mpsc::UnboundedReceiver<Tagged>, generation: Generation) {
  while let Some(tagged) = events.recv().await {
    print_event(&tagged, generation);
    if tagged.generation == generation && tagged.event.is_terminal() {
      return;
    }
  }
  std::future::pending::<()>().await
}

fn print_event(tagged: &Tagged, generation: Generation) {
  if tagged.generation != generation {
    return;
  }

  match serde_json::to_string(tagged) {
    Ok(line) => println!("{line}"),
    Err(err) => log::error!("Failed to serialize event: {err}"),
  }
}

impl Output {
  fn new(
    request: request::Output,
    state: State,
    parameters: &Parameters,
    gateway: &str,
  ) -> Self {
    let name = match &state {
      State::Idle => "idle",
      State::AwaitingDeposit { .. } => "awaiting_deposit",
      State::AwaitingReceipt { .. } => "awaiting_receipt",
      State::Settled { .. } => "settled",
      State::Refunded { .. } => "refunded",
    };

    let mut output = Self {
      request,
      state: name.into(),
      deposit: state.deposit().map(|deposit| deposit.txid.to_string()),
      receipt: None,
      cid: None,
      links: Vec::new(),
      refund: None,
    };

    match state {
      State::Settled { receipt, .. } => {
        let cid = receipt.payload_text();
        output.links = gateway_links(gateway, &cid);
        output.receipt = Some(receipt.txid.to_string());
        output.cid = Some(cid);
      }
      State::Refunded {
        receipt, reason, ..
      } => {
        output.receipt = Some(receipt.txid.to_string());
        output.refund = Some(reason.description(parameters));
      }
      _ => {}
    }

    output
  }
}
