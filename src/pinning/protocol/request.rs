use super::{
  error::{Error, ValidationError},
  params::{MAX_URL_BYTE_COUNT, PIN_LITERAL, PROTOCOL_LITERAL},
  resolver::Parameters,
  script,
};
use crate::pinning::custom_serde::ScriptHexSerde;
use bitcoin::{Amount, ScriptBuf};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// What the user asks to pin: a remote URL or data to upload first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
  Url(&'a str),
  Raw(&'a [u8]),
}

/// Checks a payload of `size` bytes against the service limits.
pub fn validate(payload: Payload, size: u64, max_size: u32) -> Result<(), ValidationError> {
  if let Payload::Url(url) = payload {
    validate_url(url)?;
  }

  if size == 0 {
    return Err(ValidationError::EmptyPayload);
  }

  let max = u64::from(max_size);
  if size > max {
    return Err(match payload {
      Payload::Url(_) => ValidationError::RemoteTooLarge { size, max },
      Payload::Raw(_) => ValidationError::PayloadTooLarge { size, max },
    });
  }

  Ok(())
}

/// Checks URL syntax and that the URL fits the pin message.
pub fn validate_url(url: &str) -> Result<Url, ValidationError> {
  let parsed = Url::parse(url).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

  if url.len() > MAX_URL_BYTE_COUNT {
    return Err(ValidationError::UrlTooLong(url.len()));
  }

  Ok(parsed)
}

/// A pin request ready to be paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinRequest {
  pub url: String,
  pub fee_sats: u32,
  #[serde(with = "ScriptHexSerde")]
  pub encoded: ScriptBuf,
  pub pay_instruction: String,
}

impl PinRequest {
  pub fn chunks(url: &str) -> [&[u8]; 3] {
    [PROTOCOL_LITERAL, PIN_LITERAL, url.as_bytes()]
  }

  pub fn fee_amount(&self) -> Amount {
    Amount::from_sat(u64::from(self.fee_sats))
  }

  /// Hex of the null-data payload without the leading OP_RETURN, as wallets
  /// expect it in `op_return_raw`.
  pub fn op_return_raw(&self) -> String {
    hex::encode(&self.encoded.as_bytes()[1..])
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinRequestBuilder {
  deposit_address: String,
  parameters: Parameters,
}

impl PinRequestBuilder {
  pub fn new(deposit_address: impl Into<String>, parameters: Parameters) -> Self {
    Self {
      deposit_address: deposit_address.into(),
      parameters,
    }
  }

  pub fn parameters(&self) -> Parameters {
    self.parameters
  }

  pub fn validate(&self, payload: Payload, size: u64) -> Result<(), ValidationError> {
    validate(payload, size, self.parameters.max_size)
  }

  pub fn build(&self, url: &str) -> Result<PinRequest, Error> {
    validate_url(url)?;

    let encoded = script::encode(&PinRequest::chunks(url))?;
    let op_return_raw = hex::encode(&encoded.as_bytes()[1..]);

    Ok(PinRequest {
      url: url.to_string(),
      fee_sats: self.parameters.fee,
      pay_instruction: format!(
        "{}?amount={}&op_return_raw={}",
        self.deposit_address,
        self.parameters.fee_coins(),
        op_return_raw
      ),
      encoded,
    })
  }
}
