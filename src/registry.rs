//! Route descriptors and the name index `url_for` works from.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::engine::Next;
use crate::error::{Result, RouterError};
use crate::http::{HttpRequest, HttpResponse};
use crate::reverse::{self, UrlOptions};

/// Method used when a descriptor does not name one.
pub const DEFAULT_METHOD: &str = "get";

/// A route handler: request, response, continuation and the router's `url_for`.
pub type Handler =
    Arc<dyn Fn(&mut HttpRequest, &mut HttpResponse, Next<'_>, &UrlFor) + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut HttpRequest, &mut HttpResponse, Next<'_>, &UrlFor) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// How a descriptor names its handler.
#[derive(Clone)]
pub enum HandlerRef {
    /// `"Controller.action"`, resolved against a [`Controllers`](crate::Controllers) map.
    Named(String),
    Direct(Handler),
}

impl HandlerRef {
    pub fn describe(&self) -> String {
        match self {
            HandlerRef::Named(reference) => reference.clone(),
            HandlerRef::Direct(_) => "<fn>".to_string(),
        }
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Named(reference) => f.debug_tuple("Named").field(reference).finish(),
            HandlerRef::Direct(_) => f.write_str("Direct(<fn>)"),
        }
    }
}

/// One entry of a declarative route table.
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    pub path: String,
    pub name: Option<String>,
    pub method: Option<String>,
    pub handler: Option<HandlerRef>,
    /// Always reverse to an absolute `https://` URL.
    pub secure: bool,
}

impl RouteDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        RouteDescriptor {
            path: path.into(),
            name: None,
            method: None,
            handler: None,
            secure: false,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Refer to a controller action as `"Controller.action"`.
    pub fn handler(mut self, reference: impl Into<String>) -> Self {
        self.handler = Some(HandlerRef::Named(reference.into()));
        self
    }

    pub fn handler_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HttpRequest, &mut HttpResponse, Next<'_>, &UrlFor) + Send + Sync + 'static,
    {
        self.handler = Some(HandlerRef::Direct(handler(f)));
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// The declared method, or [`DEFAULT_METHOD`].
    pub fn http_method(&self) -> &str {
        self.method.as_deref().unwrap_or(DEFAULT_METHOD)
    }
}

/// Name index over a shared route list, plus the host and base path URLs are
/// generated against. Never mutated after construction.
#[derive(Debug)]
pub struct RouteRegistry {
    routes: Arc<[RouteDescriptor]>,
    by_name: HashMap<String, usize>,
    host: String,
    base_path: Option<String>,
}

impl RouteRegistry {
    pub fn new(routes: Arc<[RouteDescriptor]>, host: &str, base_path: Option<&str>) -> Result<Self> {
        let mut by_name = HashMap::new();

        for (index, route) in routes.iter().enumerate() {
            let name = match route.name.as_deref() {
                Some(name) if !name.is_empty() => name,
                _ => continue,
            };
            if by_name.insert(name.to_string(), index).is_some() {
                return Err(RouterError::DuplicateRouteName(name.to_string()));
            }
        }

        if host.trim().is_empty() {
            return Err(RouterError::InvalidHost);
        }

        log::debug!(
            "Indexed {} named routes out of {} for host {}",
            by_name.len(),
            routes.len(),
            host
        );

        Ok(RouteRegistry {
            routes,
            by_name,
            host: host.to_string(),
            base_path: base_path
                .map(|p| p.trim_end_matches('/'))
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        })
    }

    pub fn get(&self, name: &str) -> Option<&RouteDescriptor> {
        self.by_name.get(name).map(|&index| &self.routes[index])
    }

    pub fn routes(&self) -> &Arc<[RouteDescriptor]> {
        &self.routes
    }

    /// The base path with any trailing `/` removed; `None` when that leaves nothing.
    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    pub fn url_for(&self, name: &str, options: &UrlOptions) -> Result<String> {
        let route = self
            .get(name)
            .ok_or_else(|| RouterError::UnknownRoute(name.to_string()))?;
        reverse::reverse(route, options, &self.host, self.base_path())
    }
}

/// `url_for` bound to one registry. Cheap to clone; clones compare equal.
#[derive(Debug, Clone)]
pub struct UrlFor {
    registry: Arc<RouteRegistry>,
}

impl UrlFor {
    pub fn new(registry: Arc<RouteRegistry>) -> Self {
        UrlFor { registry }
    }

    pub fn build(&self, name: &str, options: &UrlOptions) -> Result<String> {
        self.registry.url_for(name, options)
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }
}

impl PartialEq for UrlFor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry)
    }
}

impl Eq for UrlFor {}
