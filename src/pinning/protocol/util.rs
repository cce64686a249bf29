use bitcoin::{Amount, Denomination};

/// Renders `amount` in whole coins without trailing zeros, e.g. 250000 sats
/// as `0.0025`.
pub fn format_coins(amount: Amount) -> String {
  amount.to_string_in(Denomination::Bitcoin)
}

/// Text of a protocol chunk. Chunks that are not UTF-8 are rendered lossily;
/// they are only ever compared with or shown as ASCII.
pub(crate) fn chunk_text(chunk: &[u8]) -> String {
  String::from_utf8_lossy(chunk).into_owned()
}
