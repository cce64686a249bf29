#![no_main]

use {bitcoin::Script, ipbc::pinning::protocol::script, libfuzzer_sys::fuzz_target};

fuzz_target!(|input: &[u8]| {
  if let Ok(chunks) = script::decode(Script::from_bytes(input)) {
    let reencoded = script::encode(&chunks).unwrap();
    assert_eq!(script::decode(&reencoded).unwrap(), chunks);
  }
});
