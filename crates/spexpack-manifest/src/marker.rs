//! Environment markers gating dependency entries
//!
//! A marker is a boolean expression over the evaluating environment, e.g.
//! `python_version == '3.9'` or `sys_platform != 'win32' and python_version >= '3.10'`.
//! Version-valued variables compare as versions, platform variables compare
//! lexically.

use crate::errors::ManifestError;
use crate::specifier::{CompareOp, Specifier};
use crate::version::Version;
use std::fmt;
use std::str::FromStr;

/// Environment variables a marker may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerVar {
    PythonVersion,
    PythonFullVersion,
    SysPlatform,
    OsName,
}

impl MarkerVar {
    pub fn name(self) -> &'static str {
        match self {
            MarkerVar::PythonVersion => "python_version",
            MarkerVar::PythonFullVersion => "python_full_version",
            MarkerVar::SysPlatform => "sys_platform",
            MarkerVar::OsName => "os_name",
        }
    }

    fn is_version(self) -> bool {
        matches!(self, MarkerVar::PythonVersion | MarkerVar::PythonFullVersion)
    }
}

impl FromStr for MarkerVar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "python_version" => Ok(MarkerVar::PythonVersion),
            "python_full_version" => Ok(MarkerVar::PythonFullVersion),
            "sys_platform" => Ok(MarkerVar::SysPlatform),
            "os_name" => Ok(MarkerVar::OsName),
            other => Err(format!("unknown marker variable '{}'", other)),
        }
    }
}

/// The environment a marker is evaluated against
#[derive(Debug, Clone)]
pub struct Environment {
    pub python_version: Version,
    pub python_full_version: Version,
    pub sys_platform: String,
    pub os_name: String,
}

impl Environment {
    /// Build an environment from an interpreter version (`3.9` or `3.9.7`)
    /// and a platform name (`linux`, `darwin`, `win32`)
    pub fn new(python: &str, sys_platform: &str) -> Result<Self, ManifestError> {
        let full = Version::parse(python)?;
        let os_name = if sys_platform == "win32" {
            "nt"
        } else {
            "posix"
        };
        Ok(Environment {
            python_version: full.truncated(2),
            python_full_version: full.truncated(3),
            sys_platform: sys_platform.to_string(),
            os_name: os_name.to_string(),
        })
    }
}

/// One side of a comparison: pre-parsed per variable kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerTest {
    Version(Specifier),
    Str { op: CompareOp, value: String },
}

/// Parsed marker expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    And(Vec<Marker>),
    Or(Vec<Marker>),
    Compare { var: MarkerVar, test: MarkerTest },
}

impl Marker {
    /// Parse a marker expression
    pub fn parse(input: &str) -> Result<Self, ManifestError> {
        let invalid =
            |message: String| ManifestError::InvalidMarker(input.to_string(), message);
        let tokens = tokenize(input).map_err(&invalid)?;
        let mut parser = Parser {
            tokens,
            position: 0,
        };
        let marker = parser.parse_or().map_err(&invalid)?;
        if parser.position != parser.tokens.len() {
            return Err(invalid("trailing tokens after expression".to_string()));
        }
        Ok(marker)
    }

    /// Evaluate against a concrete environment
    pub fn eval(&self, env: &Environment) -> bool {
        match self {
            Marker::And(parts) => parts.iter().all(|part| part.eval(env)),
            Marker::Or(parts) => parts.iter().any(|part| part.eval(env)),
            Marker::Compare { var, test } => match test {
                MarkerTest::Version(spec) => {
                    let candidate = match var {
                        MarkerVar::PythonVersion => &env.python_version,
                        _ => &env.python_full_version,
                    };
                    spec.contains(candidate)
                }
                MarkerTest::Str { op, value } => {
                    let actual = match var {
                        MarkerVar::SysPlatform => env.sys_platform.as_str(),
                        _ => env.os_name.as_str(),
                    };
                    match op {
                        CompareOp::Eq => actual == value,
                        CompareOp::Ne => actual != value,
                        CompareOp::Le => actual <= value.as_str(),
                        CompareOp::Ge => actual >= value.as_str(),
                        CompareOp::Lt => actual < value.as_str(),
                        CompareOp::Gt => actual > value.as_str(),
                        CompareOp::Compatible => false,
                    }
                }
            },
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::And(parts) => {
                let rendered: Vec<String> = parts
                    .iter()
                    .map(|part| match part {
                        Marker::Or(_) => format!("({})", part),
                        _ => part.to_string(),
                    })
                    .collect();
                write!(f, "{}", rendered.join(" and "))
            }
            Marker::Or(parts) => {
                let rendered: Vec<String> =
                    parts.iter().map(|part| part.to_string()).collect();
                write!(f, "{}", rendered.join(" or "))
            }
            Marker::Compare { var, test } => match test {
                MarkerTest::Version(spec) => write!(
                    f,
                    "{} {} '{}'",
                    var.name(),
                    spec.op(),
                    spec
                        .to_string()
                        .trim_start_matches(spec.op().token())
                ),
                MarkerTest::Str { op, value } => {
                    write!(f, "{} {} '{}'", var.name(), op, value)
                }
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Ident(String),
    Str(String),
    Op(CompareOp),
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '\'' | '"' => {
                let quote = ch;
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some(c) => value.push(c),
                        None => return Err("unterminated string literal".to_string()),
                    }
                }
                tokens.push(Token::Str(value));
            }
            '<' | '>' | '=' | '!' | '~' => {
                let mut op = String::new();
                op.push(ch);
                chars.next();
                if chars.peek() == Some(&'=') {
                    op.push('=');
                    chars.next();
                }
                let parsed = op
                    .parse::<CompareOp>()
                    .map_err(|_| format!("unknown operator '{}'", op))?;
                tokens.push(Token::Op(parsed));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(word)) if word == keyword) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Marker, String> {
        let mut parts = vec![self.parse_and()?];
        while self.eat_keyword("or") {
            parts.push(self.parse_and()?);
        }
        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(Marker::Or(parts))
        }
    }

    fn parse_and(&mut self) -> Result<Marker, String> {
        let mut parts = vec![self.parse_atom()?];
        while self.eat_keyword("and") {
            parts.push(self.parse_atom()?);
        }
        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(Marker::And(parts))
        }
    }

    fn parse_atom(&mut self) -> Result<Marker, String> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("expected ')'".to_string()),
                }
            }
            Some(Token::Ident(name)) => {
                let var: MarkerVar = name.parse()?;
                let op = match self.next() {
                    Some(Token::Op(op)) => op,
                    _ => return Err(format!("expected operator after '{}'", name)),
                };
                let value = match self.next() {
                    Some(Token::Str(value)) => value,
                    _ => return Err("expected quoted value".to_string()),
                };
                let test = if var.is_version() {
                    let spec = Specifier::from_parts(op, &value)
                        .map_err(|e| e.to_string())?;
                    MarkerTest::Version(spec)
                } else {
                    if op == CompareOp::Compatible {
                        return Err(format!(
                            "operator '~=' not valid for '{}'",
                            var.name()
                        ));
                    }
                    MarkerTest::Str { op, value }
                };
                Ok(Marker::Compare { var, test })
            }
            _ => Err("expected marker expression".to_string()),
        }
    }
}
