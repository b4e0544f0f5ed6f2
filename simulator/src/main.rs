mod echo;
#[cfg(not(feature = "rpi"))]
mod host;
#[cfg(feature = "rpi")]
mod rpi;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(not(feature = "rpi"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    host::run().await
}

#[cfg(feature = "rpi")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    rpi::run().await
}
