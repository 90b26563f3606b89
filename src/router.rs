use std::sync::Arc;

use crate::dispatcher::{self, Controllers, DispatchTable};
use crate::error::Result;
use crate::registry::{RouteDescriptor, RouteRegistry, UrlFor};
use crate::reverse::UrlOptions;

/// A route table bound to a host: reverse routing plus dispatcher building.
///
/// ```
/// use simple_router::{RouteDescriptor, Router, UrlOptions};
///
/// let router = Router::new(
///     vec![RouteDescriptor::new("/users/:id").name("profile").handler("Users.show")],
///     "localhost",
///     None,
/// )
/// .unwrap();
///
/// let url = router.url_for("profile", &UrlOptions::new().param("id", 42)).unwrap();
/// assert_eq!(url, "/users/42");
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    routes: Arc<[RouteDescriptor]>,
    url_for: UrlFor,
}

impl Router {
    /// Index `routes` by name. Fails on duplicate names or an empty host;
    /// templates themselves are only checked once they are used.
    pub fn new(routes: Vec<RouteDescriptor>, host: &str, base_path: Option<&str>) -> Result<Self> {
        let routes: Arc<[RouteDescriptor]> = routes.into();
        let registry = RouteRegistry::new(Arc::clone(&routes), host, base_path)?;

        Ok(Router {
            routes,
            url_for: UrlFor::new(Arc::new(registry)),
        })
    }

    /// The route list exactly as given.
    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn url_for(&self, name: &str, options: &UrlOptions) -> Result<String> {
        self.url_for.build(name, options)
    }

    /// The `url_for` handle every handler of this router receives.
    pub fn url_for_fn(&self) -> UrlFor {
        self.url_for.clone()
    }

    pub fn build_dispatcher(&self, controllers: &Controllers) -> Result<DispatchTable> {
        dispatcher::build(&self.routes, controllers, &self.url_for)
    }

    /// Same as [`Router::build_dispatcher`].
    pub fn handle(&self, controllers: &Controllers) -> Result<DispatchTable> {
        self.build_dispatcher(controllers)
    }
}
