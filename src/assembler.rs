//! Two-pass assembler driver.
//!
//! Composes the scanner and parser, then runs two passes over the statement
//! list: the first assigns a byte address to every statement and records label
//! definitions, the second emits bytecode and resolves label references. On
//! failure a compiler-style diagnostic is logged and the underlying error is
//! wrapped into [`Error::AssemblingError`] with its message preserved.

use crate::errors::Error;
use crate::error;
use crate::parser::{Argument, Parser, Statement, Target};
use crate::scanner::Scanner;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Assembles source text into a flat bytecode image starting at address 0.
pub fn assemble(source: &str) -> Result<Vec<u8>, Error> {
    match assemble_inner(source) {
        Ok(image) => Ok(image),
        Err((line, error)) => {
            error!("{}", render_diagnostic(source, line, &error.to_string()));
            Err(match error {
                Error::AssemblingError(_) => error,
                other => Error::AssemblingError(other.to_string()),
            })
        }
    }
}

/// Reads and assembles a source file.
pub fn assemble_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, Error> {
    let source = fs::read_to_string(&path)
        .map_err(|e| Error::AssemblingError(format!("{}: {e}", path.as_ref().display())))?;
    assemble(&source)
}

fn assemble_inner(source: &str) -> Result<Vec<u8>, (usize, Error)> {
    let tokens = Scanner::new(source).scan().map_err(with_line)?;
    let statements = Parser::new(tokens).parse().map_err(with_line)?;

    // pass 1: assign addresses and collect label definitions
    let mut labels: HashMap<&str, u16> = HashMap::new();
    let mut address: u32 = 0;
    for statement in &statements {
        match statement {
            Statement::Label { name, line } => {
                if labels.insert(name.as_str(), address as u16).is_some() {
                    return Err((
                        *line,
                        Error::AssemblingError(format!("label '{name}' already defined")),
                    ));
                }
            }
            Statement::Instruction { opcode, line, .. } => {
                address += opcode.size() as u32;
                if address > u16::MAX as u32 + 1 {
                    return Err((
                        *line,
                        Error::AssemblingError("program exceeds the 16-bit address space".into()),
                    ));
                }
            }
        }
    }

    // pass 2: emit bytecode, resolving label references
    let mut image = Vec::with_capacity(address as usize);
    for statement in &statements {
        let Statement::Instruction {
            opcode,
            arguments,
            line,
        } = statement
        else {
            continue;
        };
        image.push(*opcode as u8);
        for argument in arguments {
            match argument {
                Argument::Register(register) => image.push(*register as u8),
                Argument::Byte(value) => image.push(*value),
                Argument::Word(value) => image.extend_from_slice(&value.to_be_bytes()),
                Argument::Target(Target::Address(address)) => {
                    image.extend_from_slice(&address.to_be_bytes())
                }
                Argument::Target(Target::Label(name)) => {
                    let Some(address) = labels.get(name.as_str()) else {
                        return Err((
                            *line,
                            Error::AssemblingError(format!("unknown label '{name}'")),
                        ));
                    };
                    image.extend_from_slice(&address.to_be_bytes());
                }
            }
        }
    }
    Ok(image)
}

fn with_line(error: Error) -> (usize, Error) {
    let line = match &error {
        Error::ScanningError { line, .. } | Error::ParsingError { line, .. } => *line,
        _ => 1,
    };
    (line, error)
}

/// Formats a compiler-style diagnostic pointing at the offending line.
pub fn render_diagnostic(source: &str, line: usize, message: &str) -> String {
    let mut diag = String::new();
    let _ = writeln!(diag, "error: {message}");
    let _ = writeln!(diag, " --> line {line}");

    if let Some(raw_line) = source.lines().nth(line.saturating_sub(1)) {
        let text = raw_line.trim_end_matches('\r');
        let indent = text.len() - text.trim_start().len();
        let span = text.trim().len().max(1);
        let _ = writeln!(diag, "  |");
        let _ = writeln!(diag, "{line:>4} | {text}");
        let _ = writeln!(diag, "  | {}{}", " ".repeat(indent), "^".repeat(span));
    }

    diag
}
