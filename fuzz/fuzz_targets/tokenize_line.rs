#![no_main]

use libfuzzer_sys::fuzz_target;
use logport_ingest::tokenizer::tokenize;

fuzz_target!(|line: &str| {
    // 크래시 없이 완료되고, 구분자는 어떤 토큰에도 남지 않는다
    for token in tokenize(line) {
        assert!(!token.contains('"'));
        assert!(!token.contains('['));
        assert!(!token.contains(']'));
    }
});
