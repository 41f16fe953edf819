//! Shared utilities for supervisor integration tests.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use silk_controller::lifecycle::{Ready, RunError, RunResult, Runnable, StopSignal};

/// How a scripted unit behaves once started.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Script {
    /// Become ready, stop cleanly when asked.
    Serve,
    /// Fail before ever becoming ready.
    FailStartup(&'static str),
    /// Become ready, then fail on its own after the delay.
    CrashAfter(Duration, &'static str),
    /// Become ready, then return `Ok` on its own after the delay.
    ExitAfter(Duration),
    /// Become ready, then fail while stopping.
    FailStop(&'static str),
    /// Never become ready; stop cleanly when asked.
    HangStartup,
    /// Become ready and ignore stop requests.
    IgnoreStop,
    /// Become ready, then take the delay to finish once stopped.
    SlowStop(Duration),
}

/// Ordered log of what scripted units did.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(&self, name: &'static str, script: Script) -> ScriptedUnit {
        ScriptedUnit {
            name,
            script,
            recorder: self.clone(),
        }
    }

    pub fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

pub struct ScriptedUnit {
    name: &'static str,
    script: Script,
    recorder: Recorder,
}

impl ScriptedUnit {
    async fn script(self, ready: Ready, mut stop: StopSignal) -> RunResult {
        let ScriptedUnit {
            name,
            script,
            recorder,
        } = self;
        recorder.push(format!("start:{name}"));

        // Recorded before notifying so the next member's start never races ahead.
        let become_ready = |ready: Ready| {
            recorder.push(format!("ready:{name}"));
            ready.notify();
        };

        match script {
            Script::Serve => {
                become_ready(ready);
                stop.recv().await;
                recorder.push(format!("stop:{name}"));
                Ok(())
            }
            Script::FailStartup(message) => {
                recorder.push(format!("fail:{name}"));
                Err(RunError::Other(message.to_string()))
            }
            Script::CrashAfter(delay, message) => {
                become_ready(ready);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        recorder.push(format!("crash:{name}"));
                        Err(RunError::Other(message.to_string()))
                    }
                    _ = stop.recv() => {
                        recorder.push(format!("stop:{name}"));
                        Ok(())
                    }
                }
            }
            Script::ExitAfter(delay) => {
                become_ready(ready);
                tokio::time::sleep(delay).await;
                recorder.push(format!("exit:{name}"));
                Ok(())
            }
            Script::FailStop(message) => {
                become_ready(ready);
                stop.recv().await;
                recorder.push(format!("stop:{name}"));
                Err(RunError::Other(message.to_string()))
            }
            Script::HangStartup => {
                stop.recv().await;
                recorder.push(format!("stop:{name}"));
                Ok(())
            }
            Script::IgnoreStop => {
                become_ready(ready);
                std::future::pending::<()>().await;
                Ok(())
            }
            Script::SlowStop(delay) => {
                become_ready(ready);
                stop.recv().await;
                recorder.push(format!("stop:{name}"));
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

impl Runnable for ScriptedUnit {
    fn run(self: Box<Self>, ready: Ready, stop: StopSignal) -> BoxFuture<'static, RunResult> {
        let name = self.name;
        let recorder = self.recorder.clone();
        Box::pin(async move {
            let result = (*self).script(ready, stop).await;
            recorder.push(format!("exited:{name}"));
            result
        })
    }
}

/// Formatted log output collected from a thread-local subscriber.
#[derive(Debug, Clone, Default)]
#[allow(dead_code)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl LogCapture {
    /// Capture events at `DEBUG` and above until the guard is dropped.
    ///
    /// The guard is per thread, so it only sees tasks polled on the
    /// current-thread runtime `#[tokio::test]` uses.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let buf = self.buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || LogWriter(buf.clone()))
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn count(&self, needle: &str) -> usize {
        let buf = self.buf.lock().unwrap();
        String::from_utf8_lossy(&buf).matches(needle).count()
    }
}

struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Strings for comparing against [`Recorder::events`].
#[allow(dead_code)]
pub fn events(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|e| e.to_string()).collect()
}
