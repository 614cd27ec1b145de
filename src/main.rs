use vesta::config::Config;
use vesta::server::{Server, ServerContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let addr = cfg.listen_addr();
    let ctx = ServerContext::from_config(cfg)?;

    let server = Server::bind(&addr, ctx).await?;
    let shutdown = server.shutdown_handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown.stop();
        }
    });

    server.run().await
}
