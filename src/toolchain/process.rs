//! Live-streamed subprocess execution.
//!
//! The external tools run for minutes and print progress continuously, so
//! their output is forwarded line by line instead of being collected at the
//! end. Stdout and stderr are merged through a shared tee.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

/// Destination for subprocess output: always the console, plus an optional
/// log file.
pub struct OutputTee {
    log: Option<File>,
}

impl OutputTee {
    pub fn console_only() -> OutputTee {
        OutputTee { log: None }
    }

    pub fn with_log(path: &Path) -> io::Result<OutputTee> {
        Ok(OutputTee {
            log: Some(File::create(path)?),
        })
    }

    pub fn line(&mut self, line: &str) {
        println!("{}", line);
        if let Some(log) = self.log.as_mut() {
            let _ = writeln!(log, "{}", line);
        }
    }

    /// Writes to the log file only. No-op for a console-only tee.
    pub fn log_note(&mut self, note: &str) {
        if let Some(log) = self.log.as_mut() {
            let _ = writeln!(log, "{}", note);
        }
    }
}

/// Runs the command, forwarding every output line through the tee as it
/// arrives. Returns the exit code, -1 when the process died on a signal.
pub fn stream_run(cmd: &mut Command, tee: &Arc<Mutex<OutputTee>>) -> io::Result<i32> {
    let mut child = cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "child stdout not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "child stderr not captured"))?;

    let stderr_tee = Arc::clone(tee);
    let stderr_thread = thread::spawn(move || forward_lines(stderr, &stderr_tee));

    forward_lines(stdout, tee);
    let _ = stderr_thread.join();

    let status = child.wait()?;
    Ok(status.code().unwrap_or(-1))
}

/// `stream_run` without a log file.
pub fn stream_run_console(cmd: &mut Command) -> io::Result<i32> {
    let tee = Arc::new(Mutex::new(OutputTee::console_only()));
    stream_run(cmd, &tee)
}

fn forward_lines<R: Read>(source: R, tee: &Mutex<OutputTee>) {
    let mut reader = BufReader::new(source);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                tee.lock().line(line.trim_end_matches(['\r', '\n']));
            }
        }
    }
}

/// Renders a command the way it is echoed before running: arguments with
/// spaces get quoted, everything else stays bare.
pub fn render_cmd(exe: &Path, args: &[String]) -> String {
    let mut parts = vec![quote_arg(&exe.display().to_string())];
    parts.extend(args.iter().map(|a| quote_arg(a)));
    parts.join(" ")
}

fn quote_arg(arg: &str) -> String {
    if arg.contains(' ') {
        format!("\"{}\"", arg)
    } else {
        arg.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_quotes_only_spaced_args() {
        let args = vec![
            "Case".to_string(),
            "-save:all".to_string(),
            "/tmp/path with spaces/out".to_string(),
        ];
        assert_eq!(
            render_cmd(Path::new("GenCase"), &args),
            "GenCase Case -save:all \"/tmp/path with spaces/out\""
        );
    }

    #[test]
    fn spawn_of_missing_exe_is_not_found() {
        let mut cmd = Command::new("definitely-not-a-real-tool-a8f3");
        let err = stream_run_console(&mut cmd).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_is_reported() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("exit 3");
        let rc = stream_run_console(&mut cmd).unwrap();
        assert_eq!(rc, 3);
    }

    #[cfg(unix)]
    #[test]
    fn both_streams_reach_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("run.log");
        let tee = Arc::new(Mutex::new(OutputTee::with_log(&log_path).unwrap()));

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo to-stdout; echo to-stderr 1>&2");
        let rc = stream_run(&mut cmd, &tee).unwrap();
        tee.lock().log_note("[Return code: 0]");
        drop(tee);

        assert_eq!(rc, 0);
        let logged = std::fs::read_to_string(&log_path).unwrap();
        assert!(logged.contains("to-stdout"));
        assert!(logged.contains("to-stderr"));
        assert!(logged.contains("[Return code: 0]"));
    }
}
