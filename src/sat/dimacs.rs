#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Reading and writing the DIMACS CNF format.
//!
//! The format typically includes:
//! - Comment lines starting with 'c'.
//! - A problem line 'p cnf <`num_variables`> <`num_clauses`>'. The counts
//!   are checked against what was actually read and a mismatch is logged,
//!   but the clauses themselves are authoritative.
//! - Clause lines of signed integers. A '0' token ends a clause and is never
//!   read as a literal. The end of a line also ends any clause still open,
//!   so files written without terminators read back the same.
//! - An optional '%' line marking the end of the data.
//!
//! Variable `i` is registered under the name `p<i>`. Ids are handed out in
//! first-seen order, so a file whose variables first appear out of order
//! gets renumbered on the way in.

use crate::sat::error::{Error, Result};
use crate::sat::formula::Cnf;
use crate::sat::literal::NEGATION;
use clap::ValueEnum;
use itertools::Itertools;
use log::warn;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// How clause lines are ended when writing.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum ClauseTerminator {
    /// Standard DIMACS: every clause line ends with `0`
    #[default]
    Zero,
    /// No terminator, one clause per line
    None,
}

impl Display for ClauseTerminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zero => write!(f, "zero"),
            Self::None => write!(f, "none"),
        }
    }
}

struct Header {
    line: usize,
    vars: usize,
    clauses: usize,
}

fn parse_header(parts: &[&str], line: usize) -> Result<Header> {
    let error = |message: &str| Error::Dimacs {
        line,
        message: message.to_owned(),
    };

    match parts {
        ["p", "cnf", vars, clauses] => Ok(Header {
            line,
            vars: vars
                .parse()
                .map_err(|_| error("variable count is not a number"))?,
            clauses: clauses
                .parse()
                .map_err(|_| error("clause count is not a number"))?,
        }),
        _ => Err(error("expected 'p cnf <variables> <clauses>'")),
    }
}

/// Parses DIMACS formatted data from a `BufRead` source.
///
/// # Errors
///
/// `Error::Io` if reading fails and `Error::Dimacs` for a malformed problem
/// line or a token that is not an integer.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Cnf> {
    let mut cnf = Cnf::new();
    let mut header: Option<Header> = None;
    let mut pending: Vec<String> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        let parts = line.split_whitespace().collect_vec();

        match parts.first() {
            None => continue,
            Some(&"%") => break,
            Some(first) if first.starts_with('c') => continue,
            Some(&"p") => {
                if header.is_some() {
                    warn!("DIMACS line {number}: repeated problem line ignored");
                } else {
                    header = Some(parse_header(&parts, number)?);
                }
                continue;
            }
            Some(_) => {}
        }

        for token in parts {
            let value: i64 = token.parse().map_err(|_| Error::Dimacs {
                line: number,
                message: format!("'{token}' is not an integer literal"),
            })?;

            if value == 0 {
                cnf.add_clause(pending.drain(..))?;
            } else if value > 0 {
                pending.push(format!("p{value}"));
            } else {
                pending.push(format!("{NEGATION}p{}", value.unsigned_abs()));
            }
        }

        if !pending.is_empty() {
            cnf.add_clause(pending.drain(..))?;
        }
    }

    if let Some(header) = header {
        if header.vars != cnf.num_vars() || header.clauses != cnf.len() {
            warn!(
                "DIMACS line {}: header declares {} variables and {} clauses, read {} and {}",
                header.line,
                header.vars,
                header.clauses,
                cnf.num_vars(),
                cnf.len()
            );
        }
    }

    Ok(cnf)
}

/// Parses a DIMACS CNF file specified by its path.
///
/// # Errors
///
/// `Error::Io` if the file cannot be opened or read, otherwise as
/// [`parse_dimacs`].
pub fn parse_file(file_path: impl AsRef<Path>) -> Result<Cnf> {
    let file = std::fs::File::open(file_path)?;
    parse_dimacs(io::BufReader::new(file))
}

/// Writes `cnf` in DIMACS format using its registry ids.
///
/// # Errors
///
/// `Error::Io` if writing fails.
pub fn write_dimacs<W: Write>(cnf: &Cnf, mut writer: W, terminator: ClauseTerminator) -> Result<()> {
    writeln!(writer, "p cnf {} {}", cnf.num_vars(), cnf.len())?;

    for clause in cnf.encode()? {
        let mut line = clause.iter().join(" ");
        if terminator == ClauseTerminator::Zero {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push('0');
        }
        writeln!(writer, "{line}")?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes `cnf` to a file, replacing it if it exists.
///
/// # Errors
///
/// `Error::Io` if the file cannot be created or written.
pub fn write_file(cnf: &Cnf, file_path: impl AsRef<Path>, terminator: ClauseTerminator) -> Result<()> {
    let file = std::fs::File::create(file_path)?;
    write_dimacs(cnf, io::BufWriter::new(file), terminator)
}

/// DIMACS text of `cnf`.
///
/// # Errors
///
/// Never fails for a formula built through its own methods.
pub fn to_dimacs_string(cnf: &Cnf, terminator: ClauseTerminator) -> Result<String> {
    let mut buffer = Vec::new();
    write_dimacs(cnf, &mut buffer, terminator)?;
    String::from_utf8(buffer).map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Cnf {
        parse_dimacs(Cursor::new(text)).unwrap()
    }

    #[test]
    fn test_parse_simple_dimacs() {
        let cnf = parse(
            "c This is a comment\n\
             p cnf 3 2\n\
             1 -2 0\n\
             2 3 0\n",
        );

        assert_eq!(cnf.len(), 2);
        assert_eq!(cnf.num_vars(), 3);
        assert_eq!(cnf.to_string(), "(p1 v ¬p2) ∧ (p2 v p3)");
        assert_eq!(cnf.encode().unwrap(), vec![vec![1, -2], vec![2, 3]]);
    }

    #[test]
    fn test_parse_dimacs_with_empty_lines_and_end_marker() {
        let cnf = parse(
            "p cnf 2 2\n\
             \n\
             1 0\n\
             \n\
             -2 0\n\
             %\n\
             c this should be ignored\n\
             5 6 0\n",
        );

        assert_eq!(cnf.len(), 2);
        assert_eq!(cnf.to_string(), "p1 ∧ ¬p2");
    }

    #[test]
    fn test_zero_is_never_a_literal() {
        let cnf = parse("1 -2 0 3 0\n0\n");
        assert_eq!(cnf.to_string(), "(p1 v ¬p2) ∧ p3 ∧ ()");
        assert!(cnf.has_empty_clauses());
    }

    #[test]
    fn test_unterminated_lines() {
        let cnf = parse("p cnf 3 2\n1 -3\n-1 2\n");
        assert_eq!(cnf.to_string(), "(p1 v ¬p3) ∧ (¬p1 v p2)");
        // first-seen order, not the DIMACS numbering
        assert_eq!(cnf.registry().id("p3"), Some(2));
        assert_eq!(cnf.registry().id("p2"), Some(3));
    }

    #[test]
    fn test_parse_dimacs_malformed_literal() {
        let result = parse_dimacs(Cursor::new("p cnf 2 1\n1 abc 0\n"));
        assert!(matches!(result, Err(Error::Dimacs { line: 2, .. })));
    }

    #[test]
    fn test_parse_dimacs_malformed_header() {
        let result = parse_dimacs(Cursor::new("p dnf 2 1\n1 2 0\n"));
        assert!(matches!(result, Err(Error::Dimacs { line: 1, .. })));
        let result = parse_dimacs(Cursor::new("p cnf x 1\n"));
        assert!(matches!(result, Err(Error::Dimacs { line: 1, .. })));
    }

    #[test]
    fn test_parse_dimacs_no_clauses() {
        let cnf = parse("p cnf 0 0\n");
        assert!(cnf.is_empty());
        assert_eq!(cnf.num_vars(), 0);
    }

    #[test]
    fn test_write_with_and_without_terminator() {
        let cnf: Cnf = "(¬a v b) ∧ a ∧ ()".parse().unwrap();

        assert_eq!(
            to_dimacs_string(&cnf, ClauseTerminator::Zero).unwrap(),
            "p cnf 2 3\n-1 2 0\n1 0\n0\n"
        );
        assert_eq!(
            to_dimacs_string(&cnf, ClauseTerminator::None).unwrap(),
            "p cnf 2 3\n-1 2\n1\n\n"
        );
    }

    #[test]
    fn test_read_back_written_text() {
        let original = parse("p cnf 4 3\n1 -2 0\n-3 4 2 0\n-4 0\n");
        for terminator in [ClauseTerminator::Zero, ClauseTerminator::None] {
            let text = to_dimacs_string(&original, terminator).unwrap();
            let reread = parse(&text);
            assert_eq!(reread.to_string(), original.to_string(), "{terminator}");
        }
    }
}
