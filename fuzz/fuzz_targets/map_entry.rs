#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use logport_ingest::format::LogFormat;
use logport_ingest::mapper::map_entry;
use logport_ingest::tokenizer::tokenize;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    format: FuzzFormat,
    line: String,
}

#[derive(Arbitrary, Debug)]
enum FuzzFormat {
    Common,
    Combined,
    CommonWithVhost,
    Custom(String),
}

impl FuzzFormat {
    fn spec(&self) -> &str {
        match self {
            FuzzFormat::Common => "common",
            FuzzFormat::Combined => "combined",
            FuzzFormat::CommonWithVhost => "common_with_vhost",
            FuzzFormat::Custom(spec) => spec,
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let Ok(format) = LogFormat::compile(input.format.spec()) else {
        return;
    };

    let tokens = tokenize(&input.line);

    // 필드 수 불일치만 Err이고, 그 외에는 필드 단위 내결함으로 Ok여야 한다
    match map_entry(&format, &tokens) {
        Ok(_) => assert_eq!(tokens.len(), format.field_count()),
        Err(_) => assert_ne!(tokens.len(), format.field_count()),
    }
});
