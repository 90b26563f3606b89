// Integration test utilities
#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use simple_router::{
    Controllers, DispatchTable, HttpRequest, HttpResponse, Next, RouteDescriptor, Server, UrlFor,
};

/// How long to wait for the server port to become available.
const PORT_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// How often to check if the port is available.
const PORT_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Timeout for socket read/write operations.
const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

pub const HOST: &str = "localhost";

/// The route table most tests run against.
pub fn valid_routes() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::new("/index").name("home").handler("Test.index").method("get"),
        RouteDescriptor::new("/users/:id").name("profile").handler("Test.user"),
        RouteDescriptor::new("/account#/register").name("register").handler("Test.register"),
        RouteDescriptor::new("/noNamePost").handler("Test.post").method("post"),
        RouteDescriptor::new("/index").handler("Test.secondIndex"),
        RouteDescriptor::new("/testThis").handler("Test.thisVal"),
    ]
}

/// Controller that records every call made to it.
#[derive(Default)]
pub struct Test {
    calls: Mutex<Vec<&'static str>>,
    receivers: Mutex<Vec<usize>>,
    url_fors: Mutex<Vec<UrlFor>>,
}

impl Test {
    fn record(&self, action: &'static str) {
        self.calls.lock().unwrap().push(action);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, action: &str) -> usize {
        self.calls().iter().filter(|&&a| a == action).count()
    }

    /// Addresses of the receivers `thisVal` ran with.
    pub fn receivers(&self) -> Vec<usize> {
        self.receivers.lock().unwrap().clone()
    }

    pub fn url_fors(&self) -> Vec<UrlFor> {
        self.url_fors.lock().unwrap().clone()
    }

    pub fn index(&self, req: &mut HttpRequest, res: &mut HttpResponse, next: Next<'_>, _url_for: &UrlFor) {
        self.record("index");
        next.run(req, res);
    }

    pub fn second_index(&self, req: &mut HttpRequest, res: &mut HttpResponse, next: Next<'_>, _url_for: &UrlFor) {
        self.record("secondIndex");
        next.run(req, res);
    }

    pub fn user(&self, req: &mut HttpRequest, res: &mut HttpResponse, next: Next<'_>, _url_for: &UrlFor) {
        self.record("user");
        next.run(req, res);
    }

    pub fn register(&self, req: &mut HttpRequest, res: &mut HttpResponse, next: Next<'_>, _url_for: &UrlFor) {
        self.record("register");
        next.run(req, res);
    }

    pub fn post(&self, req: &mut HttpRequest, res: &mut HttpResponse, next: Next<'_>, _url_for: &UrlFor) {
        self.record("post");
        next.run(req, res);
    }

    pub fn this_val(&self, req: &mut HttpRequest, res: &mut HttpResponse, next: Next<'_>, url_for: &UrlFor) {
        self.record("thisVal");
        self.receivers.lock().unwrap().push(self as *const Test as usize);
        self.url_fors.lock().unwrap().push(url_for.clone());
        next.run(req, res);
    }

    /// Answers instead of passing control on.
    pub fn respond(&self, _req: &mut HttpRequest, res: &mut HttpResponse, _next: Next<'_>, _url_for: &UrlFor) {
        self.record("respond");
        res.text("responded");
    }

    /// Echoes the `id` route parameter.
    pub fn show(&self, req: &mut HttpRequest, res: &mut HttpResponse, _next: Next<'_>, _url_for: &UrlFor) {
        self.record("show");
        let id = req.param("id").unwrap_or_default().to_string();
        res.text(format!("user {}", id));
    }

    /// Redirects to the `profile` route for id 7.
    pub fn go(&self, _req: &mut HttpRequest, res: &mut HttpResponse, _next: Next<'_>, url_for: &UrlFor) {
        self.record("go");
        match url_for.build("profile", &simple_router::UrlOptions::new().param("id", 7)) {
            Ok(location) => res.redirect(&location),
            Err(e) => res.send(500, "text/plain", e.to_string()),
        }
    }
}

/// A `Test` controller and the capability map exposing it as "Test".
pub fn test_controllers() -> (Arc<Test>, Controllers) {
    let test = Arc::new(Test::default());
    let controllers = Controllers::new().bind("Test", Arc::clone(&test), |c| {
        c.action("index", Test::index)
            .action("secondIndex", Test::second_index)
            .action("user", Test::user)
            .action("register", Test::register)
            .action("post", Test::post)
            .action("thisVal", Test::this_val)
            .action("respond", Test::respond)
            .action("show", Test::show)
            .action("go", Test::go)
    });
    (test, controllers)
}

/// Wait for a port to become available within timeout
fn wait_for_port(port: u16) -> bool {
    let start = std::time::Instant::now();
    loop {
        match TcpStream::connect(format!("127.0.0.1:{}", port)) {
            Ok(_) => return true,
            Err(_) => {
                if start.elapsed() > PORT_READY_TIMEOUT {
                    return false;
                }
                thread::sleep(PORT_CHECK_INTERVAL);
            }
        }
    }
}

/// Test server that wraps the real Server for integration testing.
pub struct TestServer {
    server: Server,
}

impl TestServer {
    pub fn start(table: DispatchTable) -> Self {
        let server = Server::start_with_dynamic_port(table).expect("Failed to start test server");

        wait_for_port(server.port());

        TestServer { server }
    }

    pub fn port(&self) -> u16 {
        self.server.port()
    }

    /// Send a raw HTTP request and receive the response as a string
    pub fn send_request(&self, request: &str) -> String {
        self.send_requests(&[request]).join("\n")
    }

    /// Send multiple HTTP requests over a single persistent connection.
    /// The last request should include `Connection: close`.
    pub fn send_requests(&self, requests: &[&str]) -> Vec<String> {
        let stream = self.connect();
        let mut reader = BufReader::new(stream);

        let mut responses = Vec::with_capacity(requests.len());

        for request in requests {
            reader
                .get_mut()
                .write_all(request.as_bytes())
                .expect("Failed to write request");

            responses.push(Self::read_single_response(&mut reader));
        }

        responses
    }

    fn connect(&self) -> TcpStream {
        let stream =
            TcpStream::connect(self.server.addr()).expect("Failed to connect to test server");
        stream
            .set_read_timeout(Some(SOCKET_TIMEOUT))
            .expect("Failed to set read timeout");
        stream
            .set_write_timeout(Some(SOCKET_TIMEOUT))
            .expect("Failed to set write timeout");
        stream
    }

    /// Read a single HTTP response by parsing headers for Content-Length
    fn read_single_response<R: BufRead>(reader: &mut R) -> String {
        let mut status_line = String::new();
        reader
            .read_line(&mut status_line)
            .expect("Failed to read status line");

        let mut headers = String::new();
        let mut content_length: usize = 0;
        loop {
            let mut line = String::new();
            reader
                .read_line(&mut line)
                .expect("Failed to read header line");
            if line == "\r\n" || line.is_empty() {
                break;
            }
            if line.to_lowercase().starts_with("content-length:") {
                content_length = line
                    .split(':')
                    .nth(1)
                    .unwrap()
                    .trim()
                    .parse()
                    .expect("Invalid Content-Length");
            }
            headers.push_str(&line);
        }

        let mut body = vec![0u8; content_length];
        if content_length > 0 {
            reader.read_exact(&mut body).expect("Failed to read body");
        }

        format!(
            "{}{}\r\n{}",
            status_line,
            headers,
            String::from_utf8_lossy(&body)
        )
    }
}
