use super::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub script: String,
  pub op_return_raw: String,
}

#[derive(Debug, Parser)]
pub(crate) struct Encode {
  #[arg(long, help = "Read each <CHUNK> as hex instead of text.")]
  hex: bool,
  #[arg(required = true, help = "Push <CHUNK>s in order.")]
  chunks: Vec<String>,
}

impl Encode {
  pub(crate) fn run(self) -> SubcommandResult {
    let chunks = if self.hex {
      self
        .chunks
        .iter()
        .map(|chunk| hex::decode(chunk).with_context(|| format!("invalid hex chunk `{chunk}`")))
        .collect::<Result<Vec<Vec<u8>>>>()?
    } else {
      self
        .chunks
        .into_iter()
        .map(String::into_bytes)
        .collect()
    };

    let script = script::encode(&chunks)?;

    Ok(Box::new(Output {
      script: hex::encode(script.as_bytes()),
      op_return_raw: hex::encode(&script.as_bytes()[1..]),
    }))
  }
}
