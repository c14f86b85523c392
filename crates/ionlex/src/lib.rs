//! Streaming tokenizer for the Ion text data format.
//!
//! [`Tokenizer`] reads UTF-8 bytes of Ion text and produces a lazy stream
//! of token descriptors: a [`Token`] kind plus the half-open byte range
//! the token occupies in the source buffer. An enclosing value parser
//! drives it with [`Tokenizer::lookahead`] (up to seven tokens deep) and
//! [`Tokenizer::consume_token`], resolves reserved words with
//! [`keyword`], and asks for a token's decoded text on demand with
//! [`Tokenizer::value_as_string`].
//!
//! ```
//! use ionlex::{Token, Tokenizer};
//!
//! let mut tokenizer = Tokenizer::new("{a: [1, 2008T, \"three\"]}");
//! let mut kinds = Vec::new();
//! loop {
//!     let token = tokenizer.lookahead(0)?;
//!     kinds.push(token);
//!     if token == Token::Eof {
//!         break;
//!     }
//!     tokenizer.consume_token()?;
//! }
//! assert_eq!(
//!     kinds,
//!     [
//!         Token::OpenBrace,
//!         Token::SymbolBasic,
//!         Token::Colon,
//!         Token::OpenSquare,
//!         Token::Int,
//!         Token::Comma,
//!         Token::Timestamp,
//!         Token::Comma,
//!         Token::StringClob,
//!         Token::CloseSquare,
//!         Token::CloseBrace,
//!         Token::Eof,
//!     ]
//! );
//! # Ok::<(), ionlex::LexError>(())
//! ```

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod char_reader;
mod error;
mod escape;
mod keyword;
mod source;
mod token;
mod token_queue;
mod tokenizer;

pub use error::{ErrorKind, LexError, LexResult};
pub use keyword::{keyword, Keyword};
pub use token::Token;
pub use tokenizer::Tokenizer;

#[cfg(test)]
mod tests;
