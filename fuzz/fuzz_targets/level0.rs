#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(discovery) = wire::parse_level0(data) {
        let _ = discovery.comid();
        let _ = discovery.ssc();
        let _ = discovery.locking();
        let _ = discovery.tper();
        for feature in &discovery.features {
            assert!(feature.data.len() <= usize::from(u8::MAX));
        }
    }
});
