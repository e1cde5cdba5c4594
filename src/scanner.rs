//! Assembly source scanner.
//!
//! Converts raw source text into a flat token list terminated by
//! [`TokenKind::EndOfInput`]. Every token carries the 1-based line it started
//! on so later stages can report positioned errors.
//!
//! # Lexical rules
//!
//! - Mnemonics and label references are bare identifiers (e.g. `LDVR`, `loop`)
//! - Registers use the `$` sigil (e.g. `$R0`, `$ACC`)
//! - Numbers are decimal without a leading zero, or `0x`/`0X` hexadecimal
//! - Label definitions end with `:` (e.g. `loop:`)
//! - Sections start with `.` (e.g. `.main`)
//! - Character literals are single-quoted printable ASCII (e.g. `'a'`)
//! - `;` starts a comment running to the end of the line

use crate::errors::Error;
use crate::registers::Register;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word: a mnemonic or a label reference.
    Identifier(String),
    /// `$`-prefixed register name, resolved against the register table.
    Register(Register),
    /// Decimal or hexadecimal literal, at most 16 bits.
    Number(u16),
    /// `name:` label definition.
    Label(String),
    /// `.name` section marker.
    Section(String),
    /// Single-quoted printable ASCII literal.
    Character(u8),
    EndOfInput,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "identifier '{name}'"),
            TokenKind::Register(register) => write!(f, "register {register}"),
            TokenKind::Number(value) => write!(f, "number {value}"),
            TokenKind::Label(name) => write!(f, "label '{name}:'"),
            TokenKind::Section(name) => write!(f, "section '.{name}'"),
            TokenKind::Character(c) => write!(f, "character '{}'", *c as char),
            TokenKind::EndOfInput => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based source line the token started on.
    pub line: usize,
}

/// Single-pass scanner over assembly source text.
pub struct Scanner {
    source: Vec<char>,
    position: usize,
    line: usize,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            position: 0,
            line: 1,
        }
    }

    /// Scans the whole source into tokens.
    pub fn scan(mut self) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let line = self.line;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::EndOfInput,
                    line,
                });
                return Ok(tokens);
            };

            let kind = if c == '$' {
                self.register()?
            } else if c == '.' {
                self.section()?
            } else if c == '\'' {
                self.character()?
            } else if c.is_ascii_digit() {
                self.number()?
            } else if c.is_ascii_alphabetic() || c == '_' {
                self.identifier_or_label()
            } else {
                return Err(self.error(format!("unexpected character '{c}'")));
            };
            tokens.push(Token { kind, line });
        }
    }

    fn error(&self, message: String) -> Error {
        Error::ScanningError {
            line: self.line,
            message,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c == ';' {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn word(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        text
    }

    fn register(&mut self) -> Result<TokenKind, Error> {
        self.advance(); // $
        let name = self.word();
        match Register::from_name(&name) {
            Some(register) => Ok(TokenKind::Register(register)),
            None => Err(self.error(format!("unknown register '${name}'"))),
        }
    }

    fn section(&mut self) -> Result<TokenKind, Error> {
        self.advance(); // .
        let name = self.word();
        if name.is_empty() {
            return Err(self.error("expected a section name after '.'".into()));
        }
        Ok(TokenKind::Section(name))
    }

    fn character(&mut self) -> Result<TokenKind, Error> {
        self.advance(); // opening quote
        let Some(c) = self.advance() else {
            return Err(self.error("unterminated character literal".into()));
        };
        if !c.is_ascii() || (c as u8) < 0x20 || (c as u8) > 0x7E {
            return Err(self.error(format!(
                "character literal must be printable ASCII, found {:?}",
                c
            )));
        }
        if self.advance() != Some('\'') {
            return Err(self.error("unterminated character literal".into()));
        }
        Ok(TokenKind::Character(c as u8))
    }

    fn number(&mut self) -> Result<TokenKind, Error> {
        let mut text = String::new();
        let hex = self.peek() == Some('0')
            && matches!(self.source.get(self.position + 1), Some('x') | Some('X'));
        if hex {
            self.advance();
            self.advance();
            while let Some(c) = self.peek() {
                if !c.is_ascii_hexdigit() {
                    break;
                }
                text.push(c);
                self.advance();
            }
            if text.is_empty() {
                return Err(self.error("expected hexadecimal digits after '0x'".into()));
            }
        } else {
            while let Some(c) = self.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                text.push(c);
                self.advance();
            }
            if text.len() > 1 && text.starts_with('0') {
                return Err(self.error(format!("decimal number '{text}' has a leading zero")));
            }
        }

        let radix = if hex { 16 } else { 10 };
        let value = u32::from_str_radix(&text, radix)
            .map_err(|_| self.error(format!("invalid number '{text}'")))?;
        if value > u16::MAX as u32 {
            return Err(self.error(format!("number {value} does not fit in 16 bits")));
        }
        Ok(TokenKind::Number(value as u16))
    }

    fn identifier_or_label(&mut self) -> TokenKind {
        let name = self.word();
        if self.peek() == Some(':') {
            self.advance();
            TokenKind::Label(name)
        } else {
            TokenKind::Identifier(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source)
            .scan()
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn scans_an_instruction_line() {
        assert_eq!(
            kinds("LDVR 0xf000 $R0"),
            vec![
                TokenKind::Identifier("LDVR".into()),
                TokenKind::Number(0xF000),
                TokenKind::Register(Register::R0),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn scans_labels_sections_and_characters() {
        assert_eq!(
            kinds(".main\nloop:\n  SBVA 'a' 0x2000\n  JUMP loop"),
            vec![
                TokenKind::Section("main".into()),
                TokenKind::Label("loop".into()),
                TokenKind::Identifier("SBVA".into()),
                TokenKind::Character(b'a'),
                TokenKind::Number(0x2000),
                TokenKind::Identifier("JUMP".into()),
                TokenKind::Identifier("loop".into()),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("NOP ; ignore all of this $%^\nHALT"),
            vec![
                TokenKind::Identifier("NOP".into()),
                TokenKind::Identifier("HALT".into()),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn numbers_decimal_and_hex() {
        assert_eq!(
            kinds("0 65535 0x0 0XFF"),
            vec![
                TokenKind::Number(0),
                TokenKind::Number(65535),
                TokenKind::Number(0),
                TokenKind::Number(0xFF),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn number_errors() {
        assert!(matches!(
            Scanner::new("65536").scan(),
            Err(Error::ScanningError { line: 1, .. })
        ));
        assert!(matches!(
            Scanner::new("007").scan(),
            Err(Error::ScanningError { line: 1, .. })
        ));
        assert!(matches!(
            Scanner::new("0x").scan(),
            Err(Error::ScanningError { line: 1, .. })
        ));
    }

    #[test]
    fn unknown_register_is_an_error() {
        assert!(matches!(
            Scanner::new("MOVE $Q9 $R0").scan(),
            Err(Error::ScanningError { line: 1, .. })
        ));
    }

    #[test]
    fn errors_carry_the_right_line() {
        let source = "NOP\nNOP\n  MOVE $R0 @\nHALT";
        match Scanner::new(source).scan() {
            Err(Error::ScanningError { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains('@'), "{message}");
            }
            other => panic!("expected a scanning error, got {other:?}"),
        }
    }

    #[test]
    fn character_literal_errors() {
        assert!(Scanner::new("'a").scan().is_err());
        assert!(Scanner::new("'\t'").scan().is_err());
        assert!(Scanner::new("'").scan().is_err());
    }

    #[test]
    fn empty_source_yields_end_of_input() {
        assert_eq!(kinds("  \n ; just a comment\n"), vec![TokenKind::EndOfInput]);
    }
}
