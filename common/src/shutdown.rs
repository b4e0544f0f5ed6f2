use std::{future::Future, io::Write};

use tokio::sync::watch;
use tracing::warn;

pub const CLEANUP_NOTICE: &str = "Cleaning up. Exiting...";

/// Raises `stop` on Ctrl-C and writes the cleanup notice to `notice`.
pub fn stop_on_ctrl_c<W>(stop: watch::Sender<bool>, notice: W)
where
    W: Write + Send + 'static,
{
    stop_on(tokio::signal::ctrl_c(), stop, notice);
}

/// Raises `stop` once `signal` resolves, then writes the cleanup notice. If the
/// signal cannot be listened for, the sender is kept alive so receivers do not
/// mistake the failure for a stop.
pub fn stop_on<F, W>(signal: F, stop: watch::Sender<bool>, mut notice: W)
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
    W: Write + Send + 'static,
{
    tokio::spawn(async move {
        match signal.await {
            Ok(()) => {
                let _ = stop.send(true);
                if let Err(err) = writeln!(notice, "{CLEANUP_NOTICE}").and_then(|()| notice.flush())
                {
                    warn!("failed to print the cleanup notice: {err}");
                }
            }
            Err(err) => {
                warn!("failed to listen for ctrl-c: {err}");
                stop.closed().await;
            }
        }
    });
}
