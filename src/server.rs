//! HTTP server serving a [`DispatchTable`].

use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::compression;
use crate::dispatcher::DispatchTable;
use crate::engine::Dispatch;
use crate::http::{parse_request, HttpMethod, HttpRequest, HttpResponse};

/// How long to wait for in-flight requests to complete during shutdown.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_millis(50);

/// How often to poll for new connections in non-blocking accept loop.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

const PERSISTENT_CONNECTION_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A running HTTP server that can be gracefully shut down.
pub struct Server {
    addr: SocketAddr,
    shutdown_flag: Arc<AtomicBool>,
    /// None after shutdown
    thread_handle: Option<JoinHandle<()>>,
}

impl Server {
    /// Bind `addr` and start serving `table` on a background thread.
    pub fn start<A: ToSocketAddrs>(addr: A, table: DispatchTable) -> Result<Self> {
        let listener = TcpListener::bind(&addr).context("Failed to bind to address")?;

        let local_addr = listener
            .local_addr()
            .context("Failed to get local address")?;

        listener
            .set_nonblocking(true)
            .context("Failed to set non-blocking mode")?;

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let table = Arc::new(table);

        let shutdown_clone = Arc::clone(&shutdown_flag);
        let thread_handle = thread::spawn(move || {
            Self::run_accept_loop(listener, table, shutdown_clone);
        });

        log::info!("Server listening on {}", local_addr);

        Ok(Server {
            addr: local_addr,
            shutdown_flag,
            thread_handle: Some(thread_handle),
        })
    }

    /// Start on an OS-assigned port.
    pub fn start_with_dynamic_port(table: DispatchTable) -> Result<Self> {
        Self::start("127.0.0.1:0", table)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Initiate graceful shutdown and wait for the server to stop.
    /// Safe to call multiple times.
    pub fn shutdown(&mut self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            thread::sleep(SHUTDOWN_GRACE_PERIOD);
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown_flag.load(Ordering::SeqCst)
    }

    /// Block the calling thread until the accept loop exits.
    pub fn wait(mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    fn run_accept_loop(
        listener: TcpListener,
        table: Arc<DispatchTable>,
        shutdown_flag: Arc<AtomicBool>,
    ) {
        loop {
            if shutdown_flag.load(Ordering::SeqCst) {
                log::debug!("Server shutdown requested");
                break;
            }

            match listener.accept() {
                Ok((stream, peer_addr)) => {
                    log::debug!("Accepted connection from {}", peer_addr);
                    let table = Arc::clone(&table);
                    thread::spawn(move || {
                        Self::handle_connection(stream, &table);
                    });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    log::error!("Accept error: {}", e);
                    break;
                }
            }
        }
        log::debug!("Server accept loop terminated");
    }

    fn handle_connection(stream: TcpStream, table: &DispatchTable) {
        if let Err(e) = Self::process_requests(stream, table) {
            log::error!("Error handling connection: {}", e);
        }
    }

    fn process_requests(stream: TcpStream, table: &DispatchTable) -> Result<()> {
        // Accepted sockets can inherit the listener's non-blocking mode.
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(PERSISTENT_CONNECTION_READ_TIMEOUT))?;
        let mut writer = stream.try_clone().context("Failed to clone stream")?;
        let mut reader = BufReader::new(stream);

        while let Some(mut request) = parse_request(&mut reader).context("Failed to parse request")? {
            let response = respond(table, &mut request);
            writer
                .write_all(&response.to_bytes())
                .context("Failed to write response")?;

            if request.headers.get("connection") == Some("close") {
                break;
            }
        }
        Ok(())
    }
}

/// Dispatch one request and produce the bytes-ready response.
///
/// Nothing sent by any handler means 404. `HEAD` keeps the headers of the
/// `GET` response but drops its body.
pub fn respond(table: &DispatchTable, request: &mut HttpRequest) -> HttpResponse {
    let mut response = HttpResponse::pending();
    let outcome = table.handle(request, &mut response);

    if !response.is_sent() {
        if outcome == Dispatch::Handled {
            log::warn!("{} {} stopped without a response", request.method, request.uri);
        }
        return HttpResponse::not_found();
    }

    compression::negotiate(request, &mut response);
    if request.method == HttpMethod::Head {
        response.body.clear();
    }
    response
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown();
    }
}
