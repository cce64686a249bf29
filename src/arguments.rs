use super::*;

use shadow_rs::shadow;
shadow!(build);

#[derive(Debug, Parser)]
#[command(
  name = "ipbc",
  version(build::CLAP_LONG_VERSION),
  about = "Pin content to IPFS, paid and settled through null-data outputs"
)]
pub(crate) struct Arguments {
  #[command(flatten)]
  pub(crate) options: Options,
  #[command(subcommand)]
  pub(crate) subcommand: Subcommand,
}

impl Arguments {
  pub(crate) fn run(self) -> SubcommandResult {
    log::debug!("Running {:?}", self.subcommand);
    self.subcommand.run(self.options)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn subcommand_is_required() {
    assert!(Arguments::try_parse_from(["ipbc"]).is_err());
  }

  #[test]
  fn clap_definition_is_valid() {
    use clap::CommandFactory;
    Arguments::command().debug_assert();
  }
}
