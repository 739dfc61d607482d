//! The compiler range algebra.
//!
//! Ranges describe which compilers a feature, package, or constraint set
//! applies to. Evaluation is pure and total. The concrete syntax combines
//! `all`, `none`, kind names, bare versions, and comparisons with `&&`,
//! `||`, and parentheses:
//!
//! ```text
//! >=8.10 && <9.6
//! ghc && >=9.0 || ghcjs
//! ==8.10.7 || ==9.2.8
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use semver::Version;

use crate::compiler::{CompilerId, CompilerKind, parse_lenient_version};
use crate::error::{Error, Result};

/// Version comparison operator inside a range bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOp {
    /// Strictly below the bound.
    Lt,
    /// At or below the bound.
    Le,
    /// Exactly the bound.
    Eq,
    /// At or above the bound.
    Ge,
    /// Strictly above the bound.
    Gt,
}

impl VersionOp {
    /// Source form of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ge => ">=",
            Self::Gt => ">",
        }
    }

    fn holds(self, candidate: &Version, bound: &Version) -> bool {
        match self {
            Self::Lt => candidate < bound,
            Self::Le => candidate <= bound,
            Self::Eq => candidate == bound,
            Self::Ge => candidate >= bound,
            Self::Gt => candidate > bound,
        }
    }
}

/// A predicate over compiler identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerRange {
    /// Every compiler of one kind.
    Kind(CompilerKind),
    /// Exactly the listed versions, of any kind. Empty matches nothing.
    Points(BTreeSet<Version>),
    /// Version comparison against a bound, for any kind.
    Bound(VersionOp, Version),
    /// Both sub-ranges hold.
    And(Box<CompilerRange>, Box<CompilerRange>),
    /// Either sub-range holds.
    Or(Box<CompilerRange>, Box<CompilerRange>),
}

impl CompilerRange {
    /// The range matching every compiler (`all`).
    #[must_use]
    pub fn anything() -> Self {
        Self::Bound(VersionOp::Ge, Version::new(0, 0, 0))
    }

    /// The range matching no compiler (`none`).
    #[must_use]
    pub fn nothing() -> Self {
        Self::Points(BTreeSet::new())
    }

    /// Exact version points.
    #[must_use]
    pub fn points<I>(versions: I) -> Self
    where
        I: IntoIterator<Item = Version>,
    {
        Self::Points(versions.into_iter().collect())
    }

    /// Conjunction with another range.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Disjunction with another range.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Evaluate against one compiler. Pure and total: no failure mode.
    #[must_use]
    pub fn matches(&self, id: &CompilerId) -> bool {
        match self {
            Self::Kind(kind) => id.kind == *kind,
            Self::Points(versions) => versions.contains(&id.version),
            Self::Bound(op, bound) => op.holds(&id.version, bound),
            Self::And(a, b) => a.matches(id) && b.matches(id),
            Self::Or(a, b) => a.matches(id) || b.matches(id),
        }
    }
}

impl fmt::Display for CompilerRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kind(kind) => write!(f, "{kind}"),
            Self::Points(versions) if versions.is_empty() => f.write_str("none"),
            Self::Points(versions) => {
                let mut first = true;
                for version in versions {
                    if !first {
                        f.write_str(" || ")?;
                    }
                    write!(f, "=={version}")?;
                    first = false;
                }
                Ok(())
            }
            Self::Bound(op, bound) => write!(f, "{}{bound}", op.as_str()),
            Self::And(a, b) => {
                write_and_operand(f, a)?;
                f.write_str(" && ")?;
                write_and_operand(f, b)
            }
            Self::Or(a, b) => write!(f, "{a} || {b}"),
        }
    }
}

/// Parenthesize operands that would re-parse at the wrong precedence.
fn write_and_operand(f: &mut fmt::Formatter<'_>, range: &CompilerRange) -> fmt::Result {
    let grouped = match range {
        CompilerRange::Or(_, _) => true,
        CompilerRange::Points(versions) => versions.len() > 1,
        _ => false,
    };
    if grouped {
        write!(f, "({range})")
    } else {
        write!(f, "{range}")
    }
}

impl FromStr for CompilerRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_range(s)
    }
}

/// Parse a range expression. See the module docs for the syntax.
pub fn parse_range(input: &str) -> Result<CompilerRange> {
    let tokens = lex(input)?;
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
    };
    let range = parser.or_expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.fail("unexpected trailing input"));
    }
    Ok(range)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    All,
    Nothing,
    Kind(CompilerKind),
    Op(VersionOp),
    Version(Version),
    AndAnd,
    OrOr,
    LParen,
    RParen,
}

fn lex(input: &str) -> Result<Vec<Token>> {
    let fail = |reason: String| Error::InvalidRange {
        input: input.to_string(),
        reason,
    };
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            ' ' | '\t' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '&' => {
                if chars.get(i + 1) == Some(&'&') {
                    tokens.push(Token::AndAnd);
                    i += 2;
                } else {
                    return Err(fail("single '&', expected '&&'".to_string()));
                }
            }
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    tokens.push(Token::OrOr);
                    i += 2;
                } else {
                    return Err(fail("single '|', expected '||'".to_string()));
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Op(VersionOp::Eq));
                    i += 2;
                } else {
                    return Err(fail("single '=', expected '=='".to_string()));
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Op(VersionOp::Ge));
                    i += 2;
                } else {
                    tokens.push(Token::Op(VersionOp::Gt));
                    i += 1;
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Op(VersionOp::Le));
                    i += 2;
                } else {
                    tokens.push(Token::Op(VersionOp::Lt));
                    i += 1;
                }
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let version =
                    parse_lenient_version(&text).map_err(|e| fail(e.to_string()))?;
                tokens.push(Token::Version(version));
            }
            c if c.is_ascii_lowercase() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_lowercase() {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.as_str() {
                    "all" => tokens.push(Token::All),
                    "none" => tokens.push(Token::Nothing),
                    "ghc" => tokens.push(Token::Kind(CompilerKind::Ghc)),
                    "ghcjs" => tokens.push(Token::Kind(CompilerKind::Ghcjs)),
                    other => return Err(fail(format!("unknown name '{other}'"))),
                }
            }
            other => return Err(fail(format!("unexpected character '{other}'"))),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn fail(&self, reason: &str) -> Error {
        Error::InvalidRange {
            input: self.input.to_string(),
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn or_expr(&mut self) -> Result<CompilerRange> {
        let mut left = self.and_expr()?;
        while self.peek() == Some(&Token::OrOr) {
            self.pos += 1;
            let right = self.and_expr()?;
            left = left.or(right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<CompilerRange> {
        let mut left = self.atom()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.pos += 1;
            let right = self.atom()?;
            left = left.and(right);
        }
        Ok(left)
    }

    fn atom(&mut self) -> Result<CompilerRange> {
        match self.bump() {
            Some(Token::All) => Ok(CompilerRange::anything()),
            Some(Token::Nothing) => Ok(CompilerRange::nothing()),
            Some(Token::Kind(kind)) => Ok(CompilerRange::Kind(kind)),
            Some(Token::Version(version)) => Ok(CompilerRange::points([version])),
            Some(Token::Op(op)) => match self.bump() {
                Some(Token::Version(version)) => Ok(CompilerRange::Bound(op, version)),
                _ => Err(self.fail(&format!("expected a version after '{}'", op.as_str()))),
            },
            Some(Token::LParen) => {
                let inner = self.or_expr()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.fail("missing closing parenthesis")),
                }
            }
            _ => Err(self.fail("expected a range atom")),
        }
    }
}
