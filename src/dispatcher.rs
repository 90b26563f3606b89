//! Binding route descriptors to handlers.
//!
//! Named handler references (`"Users.show"`) resolve against an explicit
//! [`Controllers`] map supplied at build time. Each action in that map is a
//! closure that already holds its controller, so the handler always runs
//! with the controller it was declared on as its receiver.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::engine::{Dispatch, Engine, MethodFilter, Next};
use crate::error::{Result, RouterError};
use crate::http::{HttpRequest, HttpResponse};
use crate::registry::{handler, Handler, HandlerRef, RouteDescriptor, UrlFor};

/// The actions of one controller, each bound to the same instance.
pub struct ActionSet<C> {
    receiver: Arc<C>,
    actions: HashMap<String, Handler>,
}

impl<C: Send + Sync + 'static> ActionSet<C> {
    /// Expose `action` under `name`. `TypeName::method` works as `action`
    /// whenever the method has the handler signature with `&self` in front.
    pub fn action<F>(mut self, name: &str, action: F) -> Self
    where
        F: Fn(&C, &mut HttpRequest, &mut HttpResponse, Next<'_>, &UrlFor)
            + Send
            + Sync
            + 'static,
    {
        let receiver = Arc::clone(&self.receiver);
        let bound = handler(move |req, res, next, url_for| {
            action(&*receiver, req, res, next, url_for)
        });
        self.actions.insert(name.to_string(), bound);
        self
    }
}

/// Controller name → action name → bound handler.
#[derive(Clone, Default)]
pub struct Controllers {
    controllers: HashMap<String, HashMap<String, Handler>>,
}

impl Controllers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the actions of `controller` under `name`.
    pub fn bind<C, B>(mut self, name: &str, controller: Arc<C>, build: B) -> Self
    where
        C: Send + Sync + 'static,
        B: FnOnce(ActionSet<C>) -> ActionSet<C>,
    {
        let set = build(ActionSet {
            receiver: controller,
            actions: HashMap::new(),
        });
        self.controllers
            .entry(name.to_string())
            .or_default()
            .extend(set.actions);
        self
    }

    /// Look up `"Controller.action"`. Anything but exactly two dotted parts
    /// resolves to nothing.
    pub fn resolve(&self, reference: &str) -> Option<Handler> {
        let (controller, action) = reference.split('.').collect_tuple()?;
        self.controllers
            .get(controller)?
            .get(action)
            .map(Arc::clone)
    }
}

impl fmt::Debug for Controllers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self
            .controllers
            .iter()
            .flat_map(|(controller, actions)| {
                actions.keys().map(move |action| format!("{}.{}", controller, action))
            })
            .collect();
        names.sort();
        f.debug_struct("Controllers").field("actions", &names).finish()
    }
}

/// Resolved handlers registered with the request engine.
///
/// When the router has a base path the table is mounted there: only
/// requests under it are dispatched, and handlers see the path with the
/// base path removed.
#[derive(Debug)]
pub struct DispatchTable {
    engine: Engine,
    mount: Option<String>,
}

/// The part of `path` below `mount`, or `None` when it lies outside.
fn strip_mount<'a>(path: &'a str, mount: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(mount)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

impl DispatchTable {
    /// Run the handlers matching `request`, in route-table order.
    pub fn handle(&self, request: &mut HttpRequest, response: &mut HttpResponse) -> Dispatch {
        let mount = match self.mount.as_deref() {
            Some(mount) => mount,
            None => return self.engine.handle(request, response),
        };

        let rewritten = match strip_mount(request.path(), mount) {
            Some(rest) => format!("{}{}", rest, &request.uri[request.path().len()..]),
            None => return Dispatch::Unhandled,
        };

        let original = std::mem::replace(&mut request.uri, rewritten);
        let outcome = self.engine.handle(request, response);
        request.uri = original;
        outcome
    }

    pub fn mount(&self) -> Option<&str> {
        self.mount.as_deref()
    }

    pub fn len(&self) -> usize {
        self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
    }
}

fn resolve(route: &RouteDescriptor, controllers: &Controllers) -> Result<(MethodFilter, Handler)> {
    let method_name = route.http_method();
    let invalid = || RouterError::InvalidRouteHandler {
        handler: route
            .handler
            .as_ref()
            .map(HandlerRef::describe)
            .unwrap_or_else(|| "<none>".to_string()),
        method: method_name.to_string(),
    };

    let handler = match &route.handler {
        Some(HandlerRef::Named(reference)) => controllers.resolve(reference).ok_or_else(invalid)?,
        Some(HandlerRef::Direct(handler)) => Arc::clone(handler),
        None => return Err(invalid()),
    };
    let method = MethodFilter::parse(method_name).ok_or_else(invalid)?;

    Ok((method, handler))
}

/// Register every route, in order, each wrapped to receive `url_for`.
pub fn build(
    routes: &[RouteDescriptor],
    controllers: &Controllers,
    url_for: &UrlFor,
) -> Result<DispatchTable> {
    let mut engine = Engine::new();

    for route in routes {
        let (method, handler) = resolve(route, controllers)?;
        let url_for = url_for.clone();

        engine.register(method, &route.path, move |req, res, next| {
            handler(req, res, next, &url_for)
        })?;
    }

    let mount = url_for.registry().base_path().map(str::to_string);

    log::debug!(
        "Built dispatcher with {} routes mounted at {}",
        engine.len(),
        mount.as_deref().unwrap_or("/")
    );
    Ok(DispatchTable { engine, mount })
}
