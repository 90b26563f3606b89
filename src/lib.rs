//! Declarative routing with reverse URL generation.
//!
//! A [`Router`] takes an ordered table of [`RouteDescriptor`]s and a host. It
//! generates URLs for named routes through [`Router::url_for`] and, given a
//! [`Controllers`] map, builds a [`DispatchTable`] that runs matching
//! handlers in table order.

pub mod args;
pub mod compression;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod http;
pub mod pattern;
pub mod registry;
pub mod reverse;
pub mod router;
pub mod server;

pub use config::RouterConfig;
pub use dispatcher::{ActionSet, Controllers, DispatchTable};
pub use engine::{Dispatch, Next};
pub use error::{Result, RouterError};
pub use http::{HttpHeaders, HttpMethod, HttpRequest, HttpResponse};
pub use registry::{handler, Handler, HandlerRef, RouteDescriptor, UrlFor};
pub use reverse::{ParamMap, UrlOptions};
pub use router::Router;
pub use server::Server;
