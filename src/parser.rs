//! Assembly token parser.
//!
//! Turns the scanner's token list into a statement list. Instruction operands
//! are parsed against the per-opcode shape table from [`isa`](crate::isa), so
//! adding an opcode to the canonical definition list automatically teaches the
//! parser its arity and operand classes.

use crate::errors::Error;
use crate::isa::{Opcode, OperandKind};
use crate::registers::Register;
use crate::scanner::{Token, TokenKind};

/// A jump or call destination: either a literal address or a label reference
/// resolved by the assembler's second pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Address(u16),
    Label(String),
}

/// A parsed instruction operand, matching one [`OperandKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Register(Register),
    Byte(u8),
    Word(u16),
    Target(Target),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `name:` pinned to the next instruction's address.
    Label { name: String, line: usize },
    Instruction {
        opcode: Opcode,
        arguments: Vec<Argument>,
        line: usize,
    },
}

impl Statement {
    /// Source line the statement started on.
    pub fn line(&self) -> usize {
        match self {
            Statement::Label { line, .. } => *line,
            Statement::Instruction { line, .. } => *line,
        }
    }
}

/// Single-lookahead parser over the scanner's output.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parses every statement up to the end of input.
    pub fn parse(mut self) -> Result<Vec<Statement>, Error> {
        let mut statements = Vec::new();
        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::EndOfInput => return Ok(statements),
                // section markers only organize the source
                TokenKind::Section(_) => continue,
                TokenKind::Label(name) => statements.push(Statement::Label {
                    name,
                    line: token.line,
                }),
                TokenKind::Identifier(name) => {
                    let line = token.line;
                    let Some(opcode) = Opcode::from_mnemonic(&name) else {
                        return Err(Self::error(line, format!("unknown instruction '{name}'")));
                    };
                    let arguments = self.arguments(opcode, line)?;
                    statements.push(Statement::Instruction {
                        opcode,
                        arguments,
                        line,
                    });
                }
                other => {
                    return Err(Self::error(
                        token.line,
                        format!("expected LABEL or INSTRUCTION, found {other}"),
                    ));
                }
            }
        }
    }

    fn error(line: usize, message: String) -> Error {
        Error::ParsingError { line, message }
    }

    fn advance(&mut self) -> Token {
        match self.tokens.get(self.position) {
            Some(token) => {
                self.position += 1;
                token.clone()
            }
            None => Token {
                kind: TokenKind::EndOfInput,
                line: self.tokens.last().map_or(1, |token| token.line),
            },
        }
    }

    fn arguments(&mut self, opcode: Opcode, line: usize) -> Result<Vec<Argument>, Error> {
        opcode
            .operands()
            .iter()
            .map(|kind| match kind {
                OperandKind::Reg => self.register(opcode, line),
                OperandKind::Byte => Ok(Argument::Byte(self.immediate(opcode, line, 0xFF)? as u8)),
                OperandKind::Word => Ok(Argument::Word(self.immediate(opcode, line, 0xFFFF)?)),
                OperandKind::Target => self.target(opcode, line),
            })
            .collect()
    }

    fn register(&mut self, opcode: Opcode, line: usize) -> Result<Argument, Error> {
        match self.advance().kind {
            TokenKind::Register(register) => Ok(Argument::Register(register)),
            other => Err(Self::error(
                line,
                format!("{} expects a register, found {other}", opcode.mnemonic()),
            )),
        }
    }

    fn immediate(&mut self, opcode: Opcode, line: usize, max: u16) -> Result<u16, Error> {
        let value = match self.advance().kind {
            TokenKind::Number(value) => value,
            TokenKind::Character(c) => c as u16,
            other => {
                return Err(Self::error(
                    line,
                    format!("{} expects a value, found {other}", opcode.mnemonic()),
                ));
            }
        };
        if value > max {
            return Err(Self::error(
                line,
                format!(
                    "{} expects a value of at most {max}, found {value}",
                    opcode.mnemonic()
                ),
            ));
        }
        Ok(value)
    }

    fn target(&mut self, opcode: Opcode, line: usize) -> Result<Argument, Error> {
        match self.advance().kind {
            TokenKind::Number(address) => Ok(Argument::Target(Target::Address(address))),
            TokenKind::Identifier(name) => Ok(Argument::Target(Target::Label(name))),
            other => Err(Self::error(
                line,
                format!(
                    "{} expects an address or label, found {other}",
                    opcode.mnemonic()
                ),
            )),
        }
    }
}
