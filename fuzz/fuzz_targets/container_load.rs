#![no_main]
use libfuzzer_sys::fuzz_target;
use pixans::{unpack, EntropyRecord, ResidualRecord};

// Arbitrary bytes must come back as an error, never a panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(record) = EntropyRecord::from_bytes(data) {
        // Keep decode work bounded by the input size.
        if record.symbol_count <= (data.len() as u64) * 64 {
            let _ = unpack(&record);
        }
    }
    let _ = ResidualRecord::read_from(data);
});
