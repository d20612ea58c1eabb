#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _lnk = shlink::Lnk::parse(data);
});
