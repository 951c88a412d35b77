//! Boolean filter over entry names and types.
//!
//! An expression is a flat token list: predicates (`Regexp`, `FileType`)
//! separated by `and` / `or`. It is folded strictly left to right with no
//! precedence: `a or b and c` is `(a or b) and c`. An empty expression
//! matches everything.

use regex::Regex;
use thiserror::Error;

use crate::types::{Entry, FileKind};

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid regular expression {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid file type {0:?}: expected one of d, f, l")]
    InvalidFileType(char),
    #[error("malformed expression at token {index}: {reason}")]
    Syntax { index: usize, reason: &'static str },
}

/// Uncompiled token, as accepted by [`MatchExpr::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Regexp(String),
    FileType(char),
    And,
    Or,
}

impl Item {
    /// Classify a command-line token: `d`/`f`/`l` are type tests, `and`/`or` combinators, anything else a regexp.
    pub fn parse(token: &str) -> Self {
        match token {
            "d" | "f" | "l" => Item::FileType(token.chars().next().unwrap_or('f')),
            "and" => Item::And,
            "or" => Item::Or,
            _ => Item::Regexp(token.to_string()),
        }
    }

    fn is_operator(&self) -> bool {
        matches!(self, Item::And | Item::Or)
    }
}

#[derive(Clone, Debug)]
enum Pred {
    Regexp(Regex),
    FileType(FileKind),
}

impl Pred {
    fn eval(&self, name: &str, kind: FileKind) -> bool {
        match self {
            Pred::Regexp(re) => re.is_match(name),
            Pred::FileType(k) => *k == kind,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Op {
    And,
    Or,
}

/// Compiled expression. Immutable and `Sync`; share it freely across walker threads.
#[derive(Clone, Debug, Default)]
pub struct MatchExpr {
    first: Option<Pred>,
    rest: Vec<(Op, Pred)>,
}

impl MatchExpr {
    /// The expression that matches every candidate.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new<I>(items: I) -> Result<Self, MatchError>
    where
        I: IntoIterator<Item = Item>,
    {
        let items: Vec<Item> = items.into_iter().collect();
        if items.is_empty() {
            return Ok(Self::empty());
        }
        if items.len() % 2 == 0 {
            let index = items.len() - 1;
            return Err(MatchError::Syntax {
                index,
                reason: if items[index].is_operator() {
                    "expression ends with an operator"
                } else {
                    "predicates must be separated by 'and' or 'or'"
                },
            });
        }

        let mut first = None;
        let mut rest = Vec::with_capacity(items.len() / 2);
        let mut pending_op = None;
        for (index, item) in items.into_iter().enumerate() {
            let expect_operator = index % 2 == 1;
            match (expect_operator, item) {
                (true, Item::And) => pending_op = Some(Op::And),
                (true, Item::Or) => pending_op = Some(Op::Or),
                (true, _) => {
                    return Err(MatchError::Syntax {
                        index,
                        reason: "predicates must be separated by 'and' or 'or'",
                    });
                }
                (false, Item::And | Item::Or) => {
                    return Err(MatchError::Syntax {
                        index,
                        reason: "operator without a left operand",
                    });
                }
                (false, item) => {
                    let pred = compile_predicate(item)?;
                    match pending_op.take() {
                        Some(op) => rest.push((op, pred)),
                        None => first = Some(pred),
                    }
                }
            }
        }
        Ok(MatchExpr { first, rest })
    }

    /// Build from command-line tokens (see [`Item::parse`]).
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, MatchError> {
        Self::new(tokens.iter().map(|t| Item::parse(t.as_ref())))
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// Fold left to right: each operator combines the accumulator with the next predicate only.
    pub fn eval(&self, name: &str, kind: FileKind) -> bool {
        let Some(first) = &self.first else {
            return true;
        };
        self.rest
            .iter()
            .fold(first.eval(name, kind), |acc, (op, pred)| match op {
                Op::And => acc && pred.eval(name, kind),
                Op::Or => acc || pred.eval(name, kind),
            })
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        self.eval(&entry.name, entry.kind)
    }
}

fn compile_predicate(item: Item) -> Result<Pred, MatchError> {
    match item {
        Item::Regexp(pattern) => Regex::new(&pattern)
            .map(Pred::Regexp)
            .map_err(|source| MatchError::InvalidRegex { pattern, source }),
        Item::FileType(code) => FileKind::from_code(code)
            .map(Pred::FileType)
            .ok_or(MatchError::InvalidFileType(code)),
        Item::And | Item::Or => unreachable!("operators are handled by the caller"),
    }
}
