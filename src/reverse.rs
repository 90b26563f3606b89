//! Reverse routing: turn a route template plus parameters into a URL.
//!
//! Parameters that fill a `:name` placeholder are consumed; whatever is left
//! over becomes the query string. A fragment declared in the template always
//! beats one passed in the options.

use std::fmt;

use itertools::Itertools;

use crate::error::{Result, RouterError};
use crate::pattern::{self, split_fragment, Token};
use crate::registry::RouteDescriptor;

const INSECURE_SCHEME: &str = "http";
const SECURE_SCHEME: &str = "https";

/// Insertion-ordered parameter map. Values are stringified on insert, so
/// `0` and `""` are ordinary values, never "missing".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    entries: Vec<(String, String)>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`. Re-inserting an existing key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        let key = key.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// `k=v&k=v`, percent-encoded, in insertion order.
    pub fn to_query_string(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .join("&")
    }
}

impl<K: Into<String>, V: fmt::Display> FromIterator<(K, V)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = ParamMap::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Options accepted by `url_for`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlOptions {
    pub params: ParamMap,
    pub hash: Option<String>,
    pub absolute: bool,
}

impl UrlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }
}

/// Fill `pathname` from `params`.
///
/// Each parameter fills the first unfilled placeholder with its name; the
/// placeholder's separator stays, its constraint and `?` marker go. Returns
/// the finished path and the parameters that matched no placeholder.
/// Unfilled optional placeholders are dropped along with their separator; an
/// unfilled required one is an error.
pub fn substitute(pathname: &str, params: &ParamMap) -> Result<(String, ParamMap)> {
    let mut tokens = pattern::parse_path_template(pathname)?;
    let mut remaining = params.clone();

    for (key, value) in params.iter() {
        let slot = tokens
            .iter()
            .position(|token| matches!(token, Token::Param(param) if param.name == key));
        let Some(index) = slot else { continue };

        let mut filled = match &tokens[index] {
            Token::Param(param) => param.prefix.map(String::from).unwrap_or_default(),
            Token::Literal(_) => continue,
        };
        filled.push_str(&urlencoding::encode(value));
        tokens[index] = Token::Literal(filled);
        remaining.remove(key);
    }

    if let Some(missing) = pattern::keys(&tokens).into_iter().find(|key| !key.optional) {
        return Err(RouterError::MissingParameter {
            path: tokens.iter().map(Token::to_string).collect(),
            param: missing.name,
        });
    }

    Ok((pattern::strip_optional(&tokens), remaining))
}

/// Build the URL for `route`. `host` and `base_path` come from the registry.
pub fn reverse(
    route: &RouteDescriptor,
    options: &UrlOptions,
    host: &str,
    base_path: Option<&str>,
) -> Result<String> {
    let (pathname, fragment) = split_fragment(&route.path);
    let (path, remaining) = substitute(pathname, &options.params)?;

    let mut url = String::new();

    if options.absolute || route.secure {
        let scheme = if route.secure { SECURE_SCHEME } else { INSECURE_SCHEME };
        url.push_str(scheme);
        url.push_str("://");
        url.push_str(host);
    }

    url.push_str(base_path.unwrap_or_default());
    url.push_str(&path);

    if !remaining.is_empty() {
        url.push('?');
        url.push_str(&remaining.to_query_string());
    }

    let hash = fragment
        .filter(|f| !f.is_empty())
        .or_else(|| options.hash.as_deref().map(|h| h.trim_start_matches('#')))
        .filter(|h| !h.is_empty());
    if let Some(hash) = hash {
        url.push('#');
        url.push_str(hash);
    }

    Ok(url)
}
