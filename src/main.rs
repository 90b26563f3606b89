use std::sync::Arc;

use anyhow::Result;

use simple_router::config::parse_env_args;
use simple_router::{
    Controllers, HttpRequest, HttpResponse, Next, RouteDescriptor, Router, Server, UrlFor,
    UrlOptions,
};

struct Site {
    title: String,
}

impl Site {
    fn index(&self, _req: &mut HttpRequest, res: &mut HttpResponse, _next: Next<'_>, url_for: &UrlFor) {
        let body = match url_for.build("profile", &UrlOptions::new().param("id", 1).absolute()) {
            Ok(profile) => format!("{}\nfirst profile: {}\n", self.title, profile),
            Err(e) => format!("{}\n{}\n", self.title, e),
        };
        res.text(body);
    }

    fn profile(&self, req: &mut HttpRequest, res: &mut HttpResponse, _next: Next<'_>, _url_for: &UrlFor) {
        let id = req.param("id").unwrap_or_default();
        res.text(format!("profile {}\n", id));
    }

    fn me(&self, req: &mut HttpRequest, res: &mut HttpResponse, next: Next<'_>, url_for: &UrlFor) {
        match url_for.build("profile", &UrlOptions::new().param("id", 1)) {
            Ok(location) => res.redirect(&location),
            Err(e) => {
                log::error!("Can't reverse profile route: {}", e);
                next.run(req, res);
            }
        }
    }

    fn posts(&self, req: &mut HttpRequest, res: &mut HttpResponse, _next: Next<'_>, _url_for: &UrlFor) {
        match req.param("slug") {
            Some(slug) => res.text(format!("post {}\n", slug)),
            None => res.text("all posts\n"),
        }
    }
}

fn log_request(req: &mut HttpRequest, res: &mut HttpResponse, next: Next<'_>, _url_for: &UrlFor) {
    log::info!("{} {}", req.method, req.uri);
    next.run(req, res);
}

fn routes() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::new("/:any(.*)").method("all").handler_fn(log_request),
        RouteDescriptor::new("/").name("home").handler("Site.index"),
        RouteDescriptor::new(r"/users/:id(\d+)").name("profile").handler("Site.profile"),
        RouteDescriptor::new("/me").name("me").handler("Site.me"),
        RouteDescriptor::new("/posts/:slug?").name("posts").handler("Site.posts"),
        RouteDescriptor::new("/login").name("login").handler("Site.index").secure(),
    ]
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();

    let config = parse_env_args()?;
    log::info!("Router configuration: {:?}", config);

    let router = Router::new(routes(), &config.host, config.base_path.as_deref())?;

    let site = Arc::new(Site {
        title: format!("Welcome to {}", config.host),
    });
    let controllers = Controllers::new().bind("Site", site, |c| {
        c.action("index", Site::index)
            .action("profile", Site::profile)
            .action("me", Site::me)
            .action("posts", Site::posts)
    });

    let table = router.build_dispatcher(&controllers)?;
    let server = Server::start(config.bind.as_str(), table)?;
    server.wait();

    Ok(())
}
