use super::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
  pub hex: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub text: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub chunks: Vec<Chunk>,
}

#[derive(Debug, Parser)]
pub(crate) struct Decode {
  #[arg(help = "Decode null-data <SCRIPT>, given as hex.")]
  script: String,
}

impl Decode {
  pub(crate) fn run(self) -> SubcommandResult {
    let bytes = hex::decode(self.script.trim()).context("script is not valid hex")?;
    let chunks = script::decode(Script::from_bytes(&bytes))?;

    Ok(Box::new(Output {
      chunks: chunks
        .into_iter()
        .map(|chunk| Chunk {
          hex: hex::encode(&chunk),
          text: String::from_utf8(chunk).ok(),
        })
        .collect(),
    }))
  }
}
