#![no_main]

use libfuzzer_sys::fuzz_target;
use reactorscope::deobfuscation::resources::pipeline::decompress;

fuzz_target!(|data: &[u8]| {
    if let Ok(payload) = decompress(data, 1 << 20) {
        assert!(!payload.is_empty());
    }
});
