use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::TcpListener;
use tokio::sync::{Notify, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::http::connection::Connection;
use crate::server::ServerContext;

/// Accepts connections and serves each one on a bounded pool of workers.
///
/// At most `workers` connections run at once. Further connections are still
/// accepted and wait for a free worker; nothing is turned away. There are no
/// read timeouts, so a client that stalls keeps its worker busy.
pub struct Server {
    listener: TcpListener,
    ctx: Arc<ServerContext>,
    workers: Arc<Semaphore>,
    shutdown: ShutdownHandle,
}

/// Stops a running [`Server`] from anywhere.
#[derive(Clone)]
pub struct ShutdownHandle {
    running: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownHandle {
    /// Stops accepting. Connections already accepted still run to completion.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Server {
    pub async fn bind(addr: &str, ctx: ServerContext) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let pool_size = ctx.config.workers.max(1);

        info!("Listening on {}", listener.local_addr()?);
        info!("Worker pool size: {}", pool_size);

        Ok(Self {
            listener,
            ctx: Arc::new(ctx),
            workers: Arc::new(Semaphore::new(pool_size)),
            shutdown: ShutdownHandle {
                running: Arc::new(AtomicBool::new(true)),
                notify: Arc::new(Notify::new()),
            },
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Accepts until stopped, then waits for every accepted connection.
    pub async fn run(self) -> anyhow::Result<()> {
        let Server {
            listener,
            ctx,
            workers,
            shutdown,
        } = self;

        // Every accepted connection, queued or running, until it finishes
        let mut connections = JoinSet::new();

        while shutdown.is_running() {
            let accepted = tokio::select! {
                res = listener.accept() => res,
                Some(done) = connections.join_next(), if !connections.is_empty() => {
                    log_join(done);
                    continue;
                }
                _ = shutdown.notify.notified() => continue,
            };

            let (socket, peer) = match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    if shutdown.is_running() {
                        warn!("Error accepting connection: {}", e);
                    }
                    continue;
                }
            };

            debug!("Accepted connection from {}", peer);

            let ctx = Arc::clone(&ctx);
            let workers = Arc::clone(&workers);
            connections.spawn(async move {
                // Queue here until a worker is free
                let Ok(_permit) = workers.acquire_owned().await else {
                    return;
                };
                Connection::new(socket, ctx).run().await;
                debug!("Connection from {} closed", peer);
            });
        }

        drop(listener);
        info!("Listener closed, waiting for in-flight connections");

        while let Some(done) = connections.join_next().await {
            log_join(done);
        }
        info!("Server stopped");
        Ok(())
    }
}

fn log_join(done: Result<(), JoinError>) {
    if let Err(e) = done {
        warn!("Connection task failed: {}", e);
    }
}
