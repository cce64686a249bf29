#![no_main]

use {ipbc::pinning::protocol::script, libfuzzer_sys::fuzz_target};

fuzz_target!(|chunks: Vec<Vec<u8>>| {
  if let Ok(script) = script::encode(&chunks) {
    assert_eq!(script::decode(&script).unwrap(), chunks);
  }
});
