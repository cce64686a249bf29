pub const PROTOCOL_LITERAL: &[u8] = b"IPBC";
pub const PIN_LITERAL: &[u8] = b"PIN";
pub const DONE_LITERAL: &[u8] = b"DONE";
pub const REFUND_LITERAL: &[u8] = b"REFUND";

/// Largest chunk a null-data output can carry with a 2-byte push length.
pub const MAX_CHUNK_LEN: usize = u16::MAX as usize;

/// Leaves room for the `IPBC` and `PIN` pushes inside the null-data size limit.
pub const MAX_URL_BYTE_COUNT: usize = 210;

pub const RECEIPT_CHUNK_COUNT: usize = 4;

pub const COMMITMENT_HEX_LEN: usize = 16;
