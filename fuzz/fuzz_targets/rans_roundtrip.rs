#![no_main]
use libfuzzer_sys::fuzz_target;
use pixans::symbol::ALPHABET;
use pixans::{rans, StaticModel};

fuzz_target!(|data: Vec<u16>| {
    let input: Vec<u16> = data.iter().map(|&s| s % ALPHABET as u16).collect();

    let model = match StaticModel::build(&input) {
        Ok(m) => m,
        Err(_) => return,
    };
    let stream = rans::encode(&input, &model).unwrap();
    let output = rans::decode(&stream, input.len(), &model).unwrap();

    assert_eq!(input, output);
});
