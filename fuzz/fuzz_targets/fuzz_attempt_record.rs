#![no_main]
use libfuzzer_sys::fuzz_target;
use sshpot::attempts::record::AttemptRecord;

fuzz_target!(|data: &[u8]| {
    if let Ok(record) = serde_json::from_slice::<AttemptRecord>(data) {
        let json = serde_json::to_string(&record).unwrap();
        let back: AttemptRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
});
