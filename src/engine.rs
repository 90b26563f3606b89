//! The request engine the dispatcher registers into.
//!
//! Layers are `(method, pattern, handler)` triples kept in registration
//! order. A request walks the layers; the first one matching method and path
//! runs, and the chain only moves on when that handler calls
//! [`Next::run`]. A handler that answers without calling it ends the chain.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::pattern::PathPattern;

type LayerFn = Box<dyn Fn(&mut HttpRequest, &mut HttpResponse, Next<'_>) + Send + Sync>;

/// Which request methods a layer answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodFilter {
    Only(HttpMethod),
    All,
}

impl MethodFilter {
    /// Parse a route's method name; `None` when the engine doesn't support it.
    pub fn parse(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("all") {
            return Some(MethodFilter::All);
        }
        name.parse().ok().map(MethodFilter::Only)
    }

    /// `GET` layers also answer `HEAD`.
    pub fn accepts(&self, method: HttpMethod) -> bool {
        match self {
            MethodFilter::All => true,
            MethodFilter::Only(HttpMethod::Get) => {
                method == HttpMethod::Get || method == HttpMethod::Head
            }
            MethodFilter::Only(expected) => *expected == method,
        }
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Only(method) => write!(f, "{}", method),
            MethodFilter::All => f.write_str("ALL"),
        }
    }
}

struct Layer {
    method: MethodFilter,
    pattern: PathPattern,
    handler: LayerFn,
}

impl Layer {
    fn matches(&self, request: &HttpRequest) -> Option<HashMap<String, String>> {
        if !self.method.accepts(request.method) {
            return None;
        }
        self.pattern.matches(request.path())
    }
}

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Some handler stopped the chain.
    Handled,
    /// Every matching handler passed control on, or none matched.
    Unhandled,
}

/// Continuation handed to each handler.
pub struct Next<'a> {
    layers: &'a [Layer],
    exhausted: &'a Cell<bool>,
}

impl<'a> Next<'a> {
    /// Run the next matching layer, if any.
    pub fn run(self, request: &mut HttpRequest, response: &mut HttpResponse) {
        let mut rest = self.layers;

        while let Some((layer, tail)) = rest.split_first() {
            if let Some(params) = layer.matches(request) {
                request.params = params;
                let next = Next {
                    layers: tail,
                    exhausted: self.exhausted,
                };
                (layer.handler)(request, response, next);
                return;
            }
            rest = tail;
        }

        self.exhausted.set(true);
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining_layers", &self.layers.len())
            .finish()
    }
}

#[derive(Default)]
pub struct Engine {
    layers: Vec<Layer>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer. The template is compiled here, so a malformed one
    /// fails registration.
    pub fn register<F>(&mut self, method: MethodFilter, template: &str, handler: F) -> Result<()>
    where
        F: Fn(&mut HttpRequest, &mut HttpResponse, Next<'_>) + Send + Sync + 'static,
    {
        let pattern = PathPattern::compile(template)?;
        log::debug!("Registered layer {} {}", method, pattern.template());
        self.layers.push(Layer {
            method,
            pattern,
            handler: Box::new(handler),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run the matching layers for `request` in registration order.
    pub fn handle(&self, request: &mut HttpRequest, response: &mut HttpResponse) -> Dispatch {
        let exhausted = Cell::new(false);
        Next {
            layers: &self.layers,
            exhausted: &exhausted,
        }
        .run(request, response);

        if exhausted.get() {
            log::debug!("No handler finished {} {}", request.method, request.uri);
            Dispatch::Unhandled
        } else {
            Dispatch::Handled
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.layers
                    .iter()
                    .map(|layer| format!("{} {}", layer.method, layer.pattern.template())),
            )
            .finish()
    }
}
