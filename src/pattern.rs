//! Path templates: `/users/:id`, `/files/:name(\w+)`, `/posts/:slug?`.
//!
//! A template is tokenized with nom into literal runs and named parameters.
//! The tokens serve two callers: the request engine compiles them into a
//! case-insensitive regex for matching, and URL reversal uses them to find
//! which placeholders are still unfilled after substitution.

use std::collections::HashMap;
use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, one_of},
    combinator::{all_consuming, map, opt, recognize},
    error::{Error as NomError, ErrorKind},
    multi::many0,
    sequence::{preceded, tuple},
    IResult,
};
use regex::Regex;

use crate::error::{Result, RouterError};

/// A named placeholder inside a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// `/` or `.` directly before the `:`; it belongs to the parameter so an
    /// omitted optional parameter takes its separator with it.
    pub prefix: Option<char>,
    pub name: String,
    pub constraint: Option<String>,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Param(Param),
}

/// The name and optionality of a template parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey {
    pub name: String,
    pub optional: bool,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(text) => f.write_str(text),
            Token::Param(param) => {
                if let Some(prefix) = param.prefix {
                    write!(f, "{}", prefix)?;
                }
                write!(f, ":{}", param.name)?;
                if let Some(constraint) = &param.constraint {
                    write!(f, "({})", constraint)?;
                }
                if param.optional {
                    f.write_str("?")?;
                }
                Ok(())
            }
        }
    }
}

/// Split a template at its first `#` into pathname and fragment.
pub fn split_fragment(template: &str) -> (&str, Option<&str>) {
    match template.split_once('#') {
        Some((pathname, fragment)) => (pathname, Some(fragment)),
        None => (template, None),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `( ... )` with balanced parentheses. Once the opening paren is consumed an
/// unterminated or empty group is a hard failure rather than a literal.
fn constraint(input: &str) -> IResult<&str, &str> {
    let (rest, _) = char('(')(input)?;
    let mut depth = 1usize;
    let mut escaped = false;

    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    if i == 0 {
                        break;
                    }
                    return Ok((&rest[i + 1..], &rest[..i]));
                }
            }
            _ => {}
        }
    }

    Err(nom::Err::Failure(NomError::new(input, ErrorKind::Char)))
}

fn param(input: &str) -> IResult<&str, Param> {
    map(
        tuple((
            opt(one_of("/.")),
            preceded(char(':'), take_while1(is_name_char)),
            opt(constraint),
            opt(char('?')),
        )),
        |(prefix, name, constraint, optional): (Option<char>, &str, Option<&str>, Option<char>)| {
            Param {
                prefix,
                name: name.to_string(),
                constraint: constraint.map(str::to_string),
                optional: optional.is_some(),
            }
        },
    )(input)
}

fn literal(input: &str) -> IResult<&str, &str> {
    alt((
        take_while1(|c: char| c != ':' && c != '/' && c != '.'),
        recognize(one_of("/.")),
    ))(input)
}

fn tokens(input: &str) -> IResult<&str, Vec<Token>> {
    all_consuming(many0(alt((
        map(param, Token::Param),
        map(literal, |text: &str| Token::Literal(text.to_string())),
    ))))(input)
}

fn invalid(template: &str, reason: impl Into<String>) -> RouterError {
    RouterError::InvalidPathTemplate {
        template: template.to_string(),
        reason: reason.into(),
    }
}

/// Tokenize a template pathname (no fragment).
pub fn parse_path_template(template: &str) -> Result<Vec<Token>> {
    if !template.starts_with('/') {
        return Err(invalid(template, "path must start with '/'"));
    }

    let parsed = match tokens(template) {
        Ok((_, parsed)) => parsed,
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            return Err(invalid(
                template,
                format!("unexpected input at '{}'", e.input),
            ));
        }
        Err(nom::Err::Incomplete(_)) => return Err(invalid(template, "incomplete template")),
    };

    // Separators are emitted one at a time; fold adjacent literal runs.
    let mut merged: Vec<Token> = Vec::with_capacity(parsed.len());
    for token in parsed {
        if let (Some(Token::Literal(run)), Token::Literal(text)) = (merged.last_mut(), &token) {
            run.push_str(text);
            continue;
        }
        merged.push(token);
    }
    Ok(merged)
}

/// The parameters a token list declares, in template order.
pub fn keys(tokens: &[Token]) -> Vec<PathKey> {
    tokens
        .iter()
        .filter_map(|token| match token {
            Token::Param(param) => Some(PathKey {
                name: param.name.clone(),
                optional: param.optional,
            }),
            Token::Literal(_) => None,
        })
        .collect()
}

/// Render tokens back to text, dropping optional parameters and their prefix.
pub fn strip_optional(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|token| !matches!(token, Token::Param(param) if param.optional))
        .map(Token::to_string)
        .collect()
}

/// A template compiled for matching request paths.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    regex: Regex,
    keys: Vec<PathKey>,
}

impl PathPattern {
    /// Compile `template`. Anything after `#` is ignored for matching.
    pub fn compile(template: &str) -> Result<Self> {
        let (pathname, _) = split_fragment(template);
        let tokens = parse_path_template(pathname)?;

        let mut source = String::from("(?i)^");
        let mut keys = Vec::new();

        for token in &tokens {
            match token {
                Token::Literal(text) => source.push_str(&regex::escape(text)),
                Token::Param(param) => {
                    let prefix = param
                        .prefix
                        .map(|c| regex::escape(&c.to_string()))
                        .unwrap_or_default();
                    let capture = match (&param.constraint, param.prefix) {
                        (Some(constraint), _) => constraint.clone(),
                        (None, Some('.')) => "[^/.]+?".to_string(),
                        (None, _) => "[^/]+?".to_string(),
                    };
                    let group = format!("(?P<p{}>{})", keys.len(), capture);

                    if param.optional {
                        source.push_str(&format!("(?:{}{})?", prefix, group));
                    } else {
                        source.push_str(&prefix);
                        source.push_str(&group);
                    }
                    keys.push(PathKey {
                        name: param.name.clone(),
                        optional: param.optional,
                    });
                }
            }
        }

        // Non-strict: a single trailing slash is always tolerated.
        source.push_str(if pathname.ends_with('/') { "?$" } else { "/?$" });

        let regex = Regex::new(&source).map_err(|e| invalid(template, e.to_string()))?;

        Ok(PathPattern {
            template: template.to_string(),
            regex,
            keys,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn keys(&self) -> &[PathKey] {
        &self.keys
    }

    /// Match a request path, returning the percent-decoded captures.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;

        let params = self
            .keys
            .iter()
            .enumerate()
            .filter_map(|(i, key)| {
                let raw = captures.name(&format!("p{}", i))?.as_str();
                let value = urlencoding::decode(raw)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| raw.to_string());
                Some((key.name.clone(), value))
            })
            .collect();

        Some(params)
    }
}
