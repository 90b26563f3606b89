use thiserror::Error;

/// Every way building a router, reversing a route or wiring a dispatcher can fail.
///
/// All of these are configuration mistakes. Nothing in the crate recovers from
/// them; start-up code is expected to propagate them and abort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("Can't add two routes with the same name: '{0}'")]
    DuplicateRouteName(String),

    #[error("The host can't be empty")]
    InvalidHost,

    #[error("No route known with name: '{0}'")]
    UnknownRoute(String),

    #[error("Can't generate a url for path {path} without {param} parameter")]
    MissingParameter { path: String, param: String },

    #[error("Invalid route handler ({handler}) or HTTP method ({method})")]
    InvalidRouteHandler { handler: String, method: String },

    #[error("Invalid path template '{template}': {reason}")]
    InvalidPathTemplate { template: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RouterError>;
