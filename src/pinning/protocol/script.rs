use super::{
  error::{EncodingError, ParseError},
  params::MAX_CHUNK_LEN,
};
use bitcoin::{
  opcodes::all::{OP_PUSHBYTES_75, OP_PUSHDATA1, OP_PUSHDATA2, OP_RETURN},
  script::{Builder, PushBytesBuf},
  Script, ScriptBuf,
};

/// Push opcode class chosen for a chunk of a given length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushEncoding {
  Direct,
  PushData1,
  PushData2,
}

impl PushEncoding {
  pub fn for_len(len: usize) -> Option<Self> {
    match len {
      0..=0x4b => Some(Self::Direct),
      0x4c..=0xff => Some(Self::PushData1),
      0x100..=MAX_CHUNK_LEN => Some(Self::PushData2),
      _ => None,
    }
  }
}

/// Builds a null-data script from `chunks`, each pushed with its minimal
/// push opcode.
pub fn encode<T: AsRef<[u8]>>(chunks: &[T]) -> Result<ScriptBuf, EncodingError> {
  let mut builder = Builder::new().push_opcode(OP_RETURN);

  for (index, chunk) in chunks.iter().enumerate() {
    let chunk = chunk.as_ref();
    if PushEncoding::for_len(chunk.len()).is_none() {
      return Err(EncodingError::ChunkTooLarge {
        index,
        len: chunk.len(),
      });
    }

    let mut buf = PushBytesBuf::new();
    buf
      .extend_from_slice(chunk)
      .map_err(|_| EncodingError::ChunkTooLarge {
        index,
        len: chunk.len(),
      })?;
    builder = builder.push_slice(buf);
  }

  Ok(builder.into_script())
}

/// Splits a null-data script back into its pushed chunks.
///
/// Parsing is bounded by the script length alone. A `0x00` opcode is an empty
/// chunk, not a terminator, so trailing empty pushes survive a round trip.
pub fn decode(script: &Script) -> Result<Vec<Vec<u8>>, ParseError> {
  let bytes = script.as_bytes();

  match bytes.first() {
    None => return Err(ParseError::Empty),
    Some(&marker) if marker != OP_RETURN.to_u8() => return Err(ParseError::MissingMarker(marker)),
    Some(_) => {}
  }

  let mut chunks = Vec::new();
  let mut cursor = 1;

  while cursor < bytes.len() {
    let offset = cursor;
    let opcode = bytes[cursor];

    let (header_len, len) = if opcode <= OP_PUSHBYTES_75.to_u8() {
      (1, usize::from(opcode))
    } else if opcode == OP_PUSHDATA1.to_u8() {
      let len = read_slice(bytes, offset, 1, 1)?;
      (2, usize::from(len[0]))
    } else if opcode == OP_PUSHDATA2.to_u8() {
      let len = read_slice(bytes, offset, 1, 2)?;
      (3, usize::from(u16::from_le_bytes([len[0], len[1]])))
    } else {
      return Err(ParseError::UnsupportedOpcode { offset, opcode });
    };

    let payload = read_slice(bytes, offset, header_len, len)?;
    chunks.push(payload.to_vec());
    cursor = offset + header_len + len;
  }

  Ok(chunks)
}

fn read_slice(bytes: &[u8], offset: usize, skip: usize, len: usize) -> Result<&[u8], ParseError> {
  let start = offset + skip;
  bytes
    .get(start..start + len)
    .ok_or(ParseError::Truncated {
      offset,
      needed: skip + len,
      remaining: bytes.len() - offset,
    })
}
