//! Lexer configuration: the keyword table and the single‑character token
//! table.
//!
//! The defaults are compile‑time perfect‑hash maps.  A host may replace either
//! table with a JSON blob such as
//!
//! ```json
//! { "keywords": { "fn": "FUN", "let": "VAR" } }
//! ```
//!
//! A table present in the blob replaces the default table wholesale; a missing
//! table keeps its default.

use std::collections::HashMap;

use log::{debug, info};
use phf::phf_map;
use serde::Deserialize;

use crate::error::Result;
use crate::token::TokenType;

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and"    => TokenType::AND,
    "break"  => TokenType::BREAK,
    "class"  => TokenType::CLASS,
    "else"   => TokenType::ELSE,
    "false"  => TokenType::FALSE,
    "fun"    => TokenType::FUN,
    "for"    => TokenType::FOR,
    "if"     => TokenType::IF,
    "nil"    => TokenType::NIL,
    "or"     => TokenType::OR,
    "print"  => TokenType::PRINT,
    "return" => TokenType::RETURN,
    "super"  => TokenType::SUPER,
    "this"   => TokenType::THIS,
    "true"   => TokenType::TRUE,
    "var"    => TokenType::VAR,
    "while"  => TokenType::WHILE,
};

static SINGLE_CHAR_TOKENS: phf::Map<char, TokenType> = phf_map! {
    '(' => TokenType::LEFT_PAREN,
    ')' => TokenType::RIGHT_PAREN,
    '{' => TokenType::LEFT_BRACE,
    '}' => TokenType::RIGHT_BRACE,
    ',' => TokenType::COMMA,
    '.' => TokenType::DOT,
    '-' => TokenType::MINUS,
    '+' => TokenType::PLUS,
    ';' => TokenType::SEMICOLON,
    '*' => TokenType::STAR,
    '?' => TokenType::QUESTION,
    ':' => TokenType::COLON,
    '%' => TokenType::PERCENT,
};

/// Token tables consumed by the [`Scanner`](crate::scanner::Scanner).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LexerConfig {
    /// Reserved word → token kind.  Anything not listed is an `IDENTIFIER`.
    pub keywords: HashMap<String, TokenType>,

    /// Punctuation character → token kind.
    pub single_char_tokens: HashMap<char, TokenType>,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            keywords: KEYWORDS
                .entries()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            single_char_tokens: SINGLE_CHAR_TOKENS
                .entries()
                .map(|(k, v)| (*k, *v))
                .collect(),
        }
    }
}

impl LexerConfig {
    /// Build a configuration from a JSON blob.
    pub fn from_json(blob: &str) -> Result<Self> {
        let config: LexerConfig = serde_json::from_str(blob)?;

        info!(
            "Loaded lexer config: {} keywords, {} single-char tokens",
            config.keywords.len(),
            config.single_char_tokens.len()
        );

        Ok(config)
    }

    pub fn keyword(&self, text: &str) -> Option<TokenType> {
        let found = self.keywords.get(text).copied();

        debug!("Keyword lookup '{}' -> {:?}", text, found);

        found
    }

    pub fn single_char(&self, c: char) -> Option<TokenType> {
        self.single_char_tokens.get(&c).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tables_cover_the_language() {
        let config = LexerConfig::default();

        assert_eq!(config.keyword("while"), Some(TokenType::WHILE));
        assert_eq!(config.keyword("break"), Some(TokenType::BREAK));
        assert_eq!(config.keyword("whilst"), None);
        assert_eq!(config.single_char('%'), Some(TokenType::PERCENT));
        assert_eq!(config.single_char('/'), None);
    }

    #[test]
    fn json_blob_replaces_only_the_tables_it_names() {
        let config = LexerConfig::from_json(r#"{ "keywords": { "let": "VAR" } }"#).unwrap();

        assert_eq!(config.keyword("let"), Some(TokenType::VAR));
        assert_eq!(config.keyword("var"), None);
        assert_eq!(config.single_char(';'), Some(TokenType::SEMICOLON));
    }

    #[test]
    fn malformed_blob_is_a_config_error() {
        let err = LexerConfig::from_json(r#"{ "keywords": { "let": "NOPE" } }"#).unwrap_err();

        assert!(matches!(err, crate::error::LoxError::Config(_)));
    }
}
