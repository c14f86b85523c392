//! Prints the token stream of an Ion text document.
//!
//! ```sh
//! cargo run --example dump_tokens -- '{greeting: "hello", when: 2024-02-29T}'
//! ```

use ionlex::{Token, Tokenizer};

const SAMPLE: &str = r#"
// sample document
config::{
  name: "demo",
  retries: 3,
  window: 2.5d0,
  since: 2024-02-29T08:30Z,
}
"#;

fn main() {
    let text = std::env::args().nth(1).unwrap_or_else(|| SAMPLE.to_owned());
    let mut tokenizer = Tokenizer::new(text.as_str());
    loop {
        match tokenizer.lookahead(0) {
            Ok(Token::Eof) => break,
            Ok(token) => {
                let (start, end) = (tokenizer.value_start(), tokenizer.value_end());
                let value = tokenizer
                    .value_as_string()
                    .unwrap_or_else(|_| String::from("<undecodable>"));
                println!("{:<28} [{start:>4}..{end:<4}) {value:?}", token.name());
                tokenizer.consume_token().expect("head token present");
            }
            Err(error) => {
                eprintln!("error: {error}");
                std::process::exit(1);
            }
        }
    }
}
