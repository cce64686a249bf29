pub mod error;
pub mod params;
pub mod receipt;
pub mod request;
pub mod resolver;
pub mod script;
mod util;

pub use self::{
  error::{
    EncodingError, Error, NetworkError, ParseError, ProtocolError, UnrecognizedFormat,
    ValidationError,
  },
  receipt::{
    classify_receipt, DepositEvent, ReceiptError, ReceiptEvent, ReceiptStatus, RefundReason,
    Settlement,
  },
  request::{validate, validate_url, Payload, PinRequest, PinRequestBuilder},
  resolver::{resolve, Parameters},
  util::format_coins,
};
