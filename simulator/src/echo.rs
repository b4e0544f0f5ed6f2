use std::{
    future::Future,
    io::Write,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{anyhow, Context};
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

use thermostat_common::{
    report::normalize_line, shutdown::CLEANUP_NOTICE, LineSource, StatusReport,
};

/// Prints every worthwhile line from `source` to `out` until `stop` is set.
/// Returns how many lines were printed.
pub fn run<S, W>(source: &mut S, out: &mut W, stop: &AtomicBool) -> anyhow::Result<usize>
where
    S: LineSource,
    W: Write,
{
    let mut printed = 0;
    while !stop.load(Ordering::Relaxed) {
        let raw = source
            .read_line()
            .context("failed to read from the serial port")?;
        let line = match normalize_line(&raw) {
            Ok(Some(line)) => line,
            Ok(None) => {
                trace!(bytes = raw.len(), "nothing to show");
                continue;
            }
            Err(err) => {
                warn!("dropping {} bytes: {err}", raw.len());
                continue;
            }
        };

        writeln!(out, "{line}").context("failed to write to stdout")?;
        out.flush().context("failed to write to stdout")?;
        printed += 1;

        match line.parse::<StatusReport>() {
            Ok(report) => debug!(
                state = report.state.as_str(),
                temp_f = report.temp_f,
                setpoint_f = report.setpoint_f,
                "status report"
            ),
            Err(err) => debug!("not a status report: {err}"),
        }
    }
    Ok(printed)
}

/// Runs the echo loop on its own thread, printing to `out`, until `shutdown`
/// resolves. The port is opened on that thread. After shutdown the loop gets
/// `grace` to notice the stop flag; a read still blocked after that is
/// abandoned.
pub async fn serve<S, F, W, C>(
    open: F,
    out: W,
    shutdown: C,
    grace: Duration,
) -> anyhow::Result<()>
where
    S: LineSource,
    F: FnOnce() -> anyhow::Result<S> + Send + 'static,
    W: Write + Send + 'static,
    C: Future<Output = std::io::Result<()>>,
{
    let stop = Arc::new(AtomicBool::new(false));
    let (done_tx, mut done_rx) = oneshot::channel();

    {
        let stop = stop.clone();
        let mut out = out;
        std::thread::Builder::new()
            .name("serial-echo".into())
            .spawn(move || {
                let result = open().and_then(|mut source| run(&mut source, &mut out, &stop));
                let _ = done_tx.send(result);
            })
            .context("failed to start the serial echo thread")?;
    }

    tokio::select! {
        done = &mut done_rx => {
            let printed = done.map_err(|_| anyhow!("serial echo thread panicked"))??;
            info!(printed, "serial echo finished");
            return Ok(());
        }
        signal = shutdown => {
            signal.context("failed to listen for ctrl-c")?;
            stop.store(true, Ordering::Relaxed);
            println!("{CLEANUP_NOTICE}");
        }
    }

    match tokio::time::timeout(grace, done_rx).await {
        Ok(Ok(result)) => {
            let printed = result?;
            info!(printed, "serial echo stopped");
            Ok(())
        }
        Ok(Err(_)) => Err(anyhow!("serial echo thread panicked")),
        Err(_) => {
            debug!("serial read still blocked, leaving it behind");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::{
        collections::VecDeque,
        sync::Mutex,
        time::Instant,
    };
    use thermostat_common::{hal::DeviceResult, DeviceError};

    /// Replays canned reads, then raises the stop flag and times out.
    struct ScriptedPort<'a> {
        reads: VecDeque<DeviceResult<Vec<u8>>>,
        stop: &'a AtomicBool,
    }

    impl<'a> ScriptedPort<'a> {
        fn new(reads: &[&[u8]], stop: &'a AtomicBool) -> Self {
            Self {
                reads: reads.iter().map(|read| Ok(read.to_vec())).collect(),
                stop,
            }
        }
    }

    impl LineSource for ScriptedPort<'_> {
        fn read_line(&mut self) -> DeviceResult<Vec<u8>> {
            match self.reads.pop_front() {
                Some(read) => read,
                None => {
                    self.stop.store(true, Ordering::Relaxed);
                    Ok(Vec::new())
                }
            }
        }
    }

    fn echo(reads: &[&[u8]]) -> (usize, String) {
        let stop = AtomicBool::new(false);
        let mut port = ScriptedPort::new(reads, &stop);
        let mut out = Vec::<u8>::new();
        let printed = run(&mut port, &mut out, &stop).unwrap();
        (printed, String::from_utf8(out).unwrap())
    }

    #[test]
    fn prints_report_and_ignores_timeout() {
        assert_eq!(
            echo(&[b"heat,68,70\n", b""]),
            (1, "heat,68,70\n".to_string())
        );
    }

    #[test]
    fn lowercases_and_strips_terminators() {
        assert_eq!(
            echo(&[b"COOL,75,72\r\n", b"Hello"]),
            (2, "cool,75,72\nhello\n".to_string())
        );
    }

    #[test]
    fn skips_single_bytes_and_bad_utf8() {
        assert_eq!(
            echo(&[b"\n", b"x", b"\xff\xfe\n", b"off,70,72\n"]),
            (1, "off,70,72\n".to_string())
        );
    }

    #[test]
    fn stops_before_reading_when_flag_is_set() {
        let stop = AtomicBool::new(true);
        let mut port = ScriptedPort::new(&[b"heat,68,70\n"], &stop);
        let mut out = Vec::<u8>::new();

        assert_eq!(run(&mut port, &mut out, &stop).unwrap(), 0);
        assert!(out.is_empty());
        assert_eq!(port.reads.len(), 1);
    }

    #[test]
    fn read_errors_end_the_loop() {
        let stop = AtomicBool::new(false);
        let mut port = ScriptedPort {
            reads: VecDeque::from([Err(DeviceError::Serial {
                port: "/dev/ttyUSB0".to_string(),
                source: "unplugged".into(),
            })]),
            stop: &stop,
        };

        let err = run(&mut port, &mut Vec::<u8>::new(), &stop).unwrap_err();
        assert_eq!(err.to_string(), "failed to read from the serial port");
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// A port that hands out its lines, then keeps timing out after `timeout`.
    /// Marks `closed` when dropped.
    struct TimedPort {
        lines: VecDeque<Vec<u8>>,
        timeout: Duration,
        closed: Arc<AtomicBool>,
    }

    impl TimedPort {
        fn new(lines: &[&[u8]], timeout: Duration) -> (Self, Arc<AtomicBool>) {
            let closed = Arc::new(AtomicBool::new(false));
            let port = Self {
                lines: lines.iter().map(|line| line.to_vec()).collect(),
                timeout,
                closed: closed.clone(),
            };
            (port, closed)
        }
    }

    impl LineSource for TimedPort {
        fn read_line(&mut self) -> DeviceResult<Vec<u8>> {
            if let Some(line) = self.lines.pop_front() {
                return Ok(line);
            }
            std::thread::sleep(self.timeout);
            Ok(Vec::new())
        }
    }

    impl Drop for TimedPort {
        fn drop(&mut self) {
            self.closed.store(true, Ordering::Relaxed);
        }
    }

    async fn after(delay: Duration) -> std::io::Result<()> {
        tokio::time::sleep(delay).await;
        Ok(())
    }

    #[tokio::test]
    async fn shutdown_stops_the_reader_between_timeouts() {
        let out = SharedBuffer::default();
        let (port, closed) = TimedPort::new(&[b"heat,68,70\n"], Duration::from_millis(20));

        serve(
            move || Ok(port),
            out.clone(),
            after(Duration::from_millis(100)),
            Duration::from_secs(2),
        )
        .await
        .unwrap();

        assert!(closed.load(Ordering::Relaxed));
        assert_eq!(out.contents(), "heat,68,70\n");
    }

    #[tokio::test]
    async fn shutdown_leaves_a_stuck_read_behind() {
        let (port, closed) = TimedPort::new(&[], Duration::from_secs(30));
        let started = Instant::now();

        serve(
            move || Ok(port),
            SharedBuffer::default(),
            after(Duration::from_millis(50)),
            Duration::from_millis(50),
        )
        .await
        .unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!closed.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn open_failure_is_returned_without_a_signal() {
        let err = serve(
            || Err::<TimedPort, _>(anyhow!("no such port")),
            SharedBuffer::default(),
            std::future::pending(),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "no such port");
    }
}
