mod amount_serde;
mod script_hex_serde;
mod txid_serde;

pub(crate) use self::{
  amount_serde::BchAmountSerde, script_hex_serde::ScriptHexSerde, txid_serde::TxidSerde,
};
