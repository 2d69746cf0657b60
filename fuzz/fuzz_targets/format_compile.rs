#![no_main]

use libfuzzer_sys::fuzz_target;
use logport_ingest::format::LogFormat;

fuzz_target!(|spec: &str| {
    // 크래시나 패닉 없이 Ok 또는 Err을 반환해야 한다
    if let Ok(format) = LogFormat::compile(spec) {
        // 컴파일이 성공하면 디렉티브가 하나 이상 존재한다
        assert!(format.field_count() >= 1);
    }
});
