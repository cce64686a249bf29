use super::*;

#[derive(Default, ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
  #[default]
  #[value(alias("main"))]
  Mainnet,
  #[value(alias("test"))]
  Testnet,
}

const DEPOSIT_ADDRESS: &str = "bitcoincash:qrsl56haj6kcw7v7lw9kzuh89v74maemqsq8h4rfqy";
const RECEIPT_ADDRESS: &str = "bitcoincash:qqk49pam6ehhzen69ur9stzvnukhwm4mmc5l83anug";

impl Chain {
  pub(crate) fn address_prefix(self) -> &'static str {
    match self {
      Self::Mainnet => cashaddr::MAINNET_PREFIX,
      Self::Testnet => cashaddr::TESTNET_PREFIX,
    }
  }

  /// Re-encodes `address` for this chain's network.
  pub(crate) fn address(self, address: &str) -> Result<String> {
    cashaddr::convert(address, self.address_prefix())
      .with_context(|| format!("invalid address `{address}`"))
  }

  pub(crate) fn deposit_address(self) -> Result<String> {
    self.address(DEPOSIT_ADDRESS)
  }

  pub(crate) fn receipt_address(self) -> Result<String> {
    self.address(RECEIPT_ADDRESS)
  }

  /// Category of the token whose mutable NFT carries the service parameters.
  pub(crate) fn parameter_token(self) -> &'static str {
    match self {
      Self::Mainnet => "9c909692e2dcc33150e8ddefb4ae4508b0780880773330d1fffd60cdb4cee6b1",
      Self::Testnet => "46a9cdaeb7f00c90896a874ecd093b0293fffa6521dbf676b0cacc39ddf791c3",
    }
  }

  pub(crate) fn upload_url(self) -> &'static str {
    match self {
      Self::Mainnet => "https://ipfs.pat.mn/u/",
      Self::Testnet => "http://localhost:8000/u/",
    }
  }

  pub(crate) fn gateway(self) -> &'static str {
    "https://ipfs.pat.mn/ipfs/"
  }
}

impl Display for Chain {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(
      f,
      "{}",
      match self {
        Self::Mainnet => "mainnet",
        Self::Testnet => "testnet",
      }
    )
  }
}
