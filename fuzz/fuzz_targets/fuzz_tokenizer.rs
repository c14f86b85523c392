#![no_main]

use ionlex::{Token, Tokenizer};
use libfuzzer_sys::fuzz_target;

// Feed arbitrary bytes through the scanner and the materializer. Errors
// are expected constantly; panics and broken ranges are the findings.
fuzz_target!(|data: &[u8]| {
    let len = data.len();
    let mut tokenizer = Tokenizer::new(data);
    loop {
        match tokenizer.lookahead(0) {
            Ok(Token::Eof) | Err(_) => break,
            Ok(_) => {
                let (start, end) = (tokenizer.value_start(), tokenizer.value_end());
                assert!(start <= end && end <= len);
                let _ = tokenizer.value_as_string();
                if tokenizer.consume_token().is_err() {
                    break;
                }
            }
        }
    }
});
