use super::*;

/// Settings read from the YAML file given with `--config`. Command-line
/// flags take precedence over these, and these over the chain defaults.
#[derive(Deserialize, Default, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
  pub(crate) chain: Option<Chain>,
  pub(crate) deposit_address: Option<String>,
  pub(crate) receipt_address: Option<String>,
  pub(crate) upload_url: Option<String>,
  pub(crate) gateway: Option<String>,
  pub(crate) parameters: Option<Parameters>,
}

impl Config {
  pub(crate) fn load(path: &Path) -> Result<Self> {
    let file = File::open(path).with_context(|| format!("failed to open config {}", path.display()))?;
    serde_yaml::from_reader(file)
      .with_context(|| format!("failed to deserialize config {}", path.display()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn example_config_file_is_valid() {
    let _: Config = serde_yaml::from_reader(File::open("ipbc.yaml").unwrap()).unwrap();
  }

  #[test]
  fn parse() {
    assert_eq!(
      serde_yaml::from_str::<Config>(
        "chain: testnet\ngateway: https://gateway.example/ipfs/\nparameters:\n  fee: 1000\n  max_size: 16384\n"
      )
      .unwrap(),
      Config {
        chain: Some(Chain::Testnet),
        gateway: Some("https://gateway.example/ipfs/".into()),
        parameters: Some(Parameters {
          fee: 1000,
          max_size: 16384
        }),
        ..Default::default()
      }
    );
  }

  #[test]
  fn unknown_fields_are_rejected() {
    assert!(serde_yaml::from_str::<Config>("rpc_url: http://localhost").is_err());
  }

  #[test]
  fn load_reports_path() {
    let tempdir = tempfile::TempDir::new().unwrap();
    let path = tempdir.path().join("missing.yaml");
    assert_eq!(
      Config::load(&path).unwrap_err().to_string(),
      format!("failed to open config {}", path.display())
    );
  }
}
