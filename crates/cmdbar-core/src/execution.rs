use crate::error::{CmdbarError, Result};
use std::env;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, error};

/// Progress of a captured command run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// One line of combined stdout/stderr, in production order per stream
    Output(String),
    /// The process exited with the given code (-1 when killed by a signal)
    Finished(i32),
    /// The process could not be launched; the message stands in for output
    Failed(String),
}

/// Spawns shell commands and streams their output.
///
/// At most one run may be active per runner: a `start` while a run is in
/// flight is rejected with `RunInProgress` rather than queued or interleaved.
pub struct CommandRunner {
    active: Arc<AtomicBool>,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start a command with captured output.
    ///
    /// The command string is handed verbatim to `$SHELL -c`. Output lines
    /// and the final `Finished`/`Failed` event arrive on the handle's
    /// channel; exactly one terminal event is sent per run.
    pub fn start(&self, command: &str) -> Result<RunHandle> {
        self.start_with(&default_shell(), command)
    }

    fn start_with(&self, shell: &str, command: &str) -> Result<RunHandle> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(CmdbarError::RunInProgress);
        }

        let (tx, rx) = mpsc::channel();
        let child = Arc::new(Mutex::new(None::<Child>));
        debug!(command, "starting captured run");

        match spawn_shell(shell, command) {
            Ok(mut spawned) => {
                let stdout = spawned.stdout.take();
                let stderr = spawned.stderr.take();
                *child.lock().unwrap() = Some(spawned);

                let readers: Vec<_> = [stdout.map(reader_box), stderr.map(reader_box)]
                    .into_iter()
                    .flatten()
                    .map(|pipe| spawn_reader(pipe, tx.clone()))
                    .collect();

                let waiter_child = child.clone();
                let waiter_active = self.active.clone();
                thread::spawn(move || {
                    // Drain both pipes before reporting the exit status
                    for reader in readers {
                        let _ = reader.join();
                    }
                    let code = await_exit(&waiter_child);
                    waiter_active.store(false, Ordering::SeqCst);
                    let _ = tx.send(RunEvent::Finished(code));
                });
            }
            Err(e) => {
                // Launch failure stands in for output rather than panicking
                error!(command, error = %e, "failed to launch command");
                self.active.store(false, Ordering::SeqCst);
                let _ = tx.send(RunEvent::Failed(format!("Failed to launch: {}", e)));
            }
        }

        Ok(RunHandle { child, events: rx })
    }
}

/// Poll for the exit status without holding the child lock across the wait,
/// so `cancel` can take the lock to deliver its kill.
fn await_exit(child: &Mutex<Option<Child>>) -> i32 {
    loop {
        {
            let mut guard = child.lock().unwrap();
            match guard.as_mut().map(Child::try_wait) {
                Some(Ok(Some(status))) => return status.code().unwrap_or(-1),
                Some(Ok(None)) => {}
                Some(Err(_)) | None => return -1,
            }
        }
        thread::sleep(Duration::from_millis(20));
    }
}

/// Handle to one in-flight captured run
pub struct RunHandle {
    child: Arc<Mutex<Option<Child>>>,
    events: Receiver<RunEvent>,
}

impl RunHandle {
    pub fn events(&self) -> &Receiver<RunEvent> {
        &self.events
    }

    /// Best-effort termination. The process may emit further output before
    /// dying; callers should discard events after cancelling.
    pub fn cancel(&self) {
        if let Some(child) = self.child.lock().unwrap().as_mut() {
            if let Err(e) = child.kill() {
                debug!(error = %e, "kill failed, process likely already exited");
            }
        }
    }
}

fn default_shell() -> String {
    #[cfg(target_os = "windows")]
    {
        "cmd".to_string()
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }
}

fn spawn_shell(shell: &str, command: &str) -> std::io::Result<Child> {
    #[cfg(target_os = "windows")]
    let arg_flag = "/c";

    #[cfg(not(target_os = "windows"))]
    let arg_flag = "-c";

    Command::new(shell)
        .args([arg_flag, command])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
}

fn reader_box(pipe: impl Read + Send + 'static) -> Box<dyn Read + Send> {
    Box::new(pipe)
}

fn spawn_reader(pipe: Box<dyn Read + Send>, tx: Sender<RunEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let reader = BufReader::new(pipe);
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.send(RunEvent::Output(line)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    })
}

/// Hand a command block to an external terminal emulator for interactive
/// execution. No output is captured and no completion is reported.
pub fn run_in_terminal(command: &str) -> Result<()> {
    debug!(command, "handing off to external terminal");

    #[cfg(target_os = "macos")]
    {
        let script = format!(
            "tell application \"Terminal\" to do script \"{}\"",
            applescript_escape(command)
        );
        let status = Command::new("osascript")
            .args(["-e", "tell application \"Terminal\" to activate", "-e", &script])
            .status();
        match status {
            Ok(exit) if exit.success() => Ok(()),
            Ok(exit) => {
                let msg = format!("osascript exited with code {:?}", exit.code());
                error!(command, "{}", msg);
                Err(CmdbarError::Terminal(msg))
            }
            Err(e) => {
                error!(command, error = %e, "failed to run osascript");
                Err(CmdbarError::Terminal(e.to_string()))
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        // Keep the window open with an interactive shell after the commands
        let wrapped = format!("{}; exec ${{SHELL:-/bin/sh}}", command);
        Command::new("x-terminal-emulator")
            .args(["-e", "sh", "-c", &wrapped])
            .spawn()
            .map(|_| ())
            .map_err(|e| {
                error!(command, error = %e, "failed to reach a terminal emulator");
                CmdbarError::Terminal(e.to_string())
            })
    }

    #[cfg(target_os = "windows")]
    {
        Command::new("cmd")
            .args(["/c", "start", "cmd", "/k", command])
            .spawn()
            .map(|_| ())
            .map_err(|e| {
                error!(command, error = %e, "failed to open a terminal window");
                CmdbarError::Terminal(e.to_string())
            })
    }
}

#[cfg(target_os = "macos")]
fn applescript_escape(command: &str) -> String {
    command.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(handle: &RunHandle) -> (Vec<String>, Option<RunEvent>) {
        let mut lines = Vec::new();
        loop {
            match handle.events().recv_timeout(Duration::from_secs(10)) {
                Ok(RunEvent::Output(line)) => lines.push(line),
                Ok(terminal) => return (lines, Some(terminal)),
                Err(_) => return (lines, None),
            }
        }
    }

    #[test]
    #[cfg(unix)]
    fn streams_lines_in_order_then_finishes() {
        let runner = CommandRunner::new();
        let handle = runner.start("echo one; echo two; echo three").unwrap();
        let (lines, terminal) = drain(&handle);
        assert_eq!(lines, ["one", "two", "three"]);
        assert_eq!(terminal, Some(RunEvent::Finished(0)));
        assert!(!runner.is_active());
    }

    #[test]
    #[cfg(unix)]
    fn reports_nonzero_exit() {
        let runner = CommandRunner::new();
        let handle = runner.start("exit 3").unwrap();
        let (_, terminal) = drain(&handle);
        assert_eq!(terminal, Some(RunEvent::Finished(3)));
    }

    #[test]
    #[cfg(unix)]
    fn captures_stderr_too() {
        let runner = CommandRunner::new();
        let handle = runner.start("echo oops 1>&2").unwrap();
        let (lines, _) = drain(&handle);
        assert_eq!(lines, ["oops"]);
    }

    #[test]
    #[cfg(unix)]
    fn second_start_while_active_is_rejected() {
        let runner = CommandRunner::new();
        let handle = runner.start("sleep 5").unwrap();
        assert!(matches!(
            runner.start("echo nope"),
            Err(CmdbarError::RunInProgress)
        ));
        handle.cancel();
        let (_, terminal) = drain(&handle);
        assert!(matches!(terminal, Some(RunEvent::Finished(_))));
        assert!(!runner.is_active());
    }

    #[test]
    #[cfg(unix)]
    fn cancel_kills_a_long_run() {
        let runner = CommandRunner::new();
        let handle = runner.start("sleep 30").unwrap();
        handle.cancel();
        let (_, terminal) = drain(&handle);
        // Killed by signal, so no exit code
        assert_eq!(terminal, Some(RunEvent::Finished(-1)));
    }

    #[test]
    fn launch_failure_is_reported_as_output() {
        let runner = CommandRunner::new();
        let handle = runner
            .start_with("/nonexistent/shell", "echo hi")
            .unwrap();
        let (_, terminal) = drain(&handle);
        assert!(matches!(terminal, Some(RunEvent::Failed(_))));
        assert!(!runner.is_active());
    }
}
