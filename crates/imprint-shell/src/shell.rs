use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use wait_timeout::ChildExt;

#[derive(Debug, Error)]
pub enum ShellError {
    /// The program could not be found on `PATH`.
    #[error("Program `{0}` is not installed")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Command `{0}` timed out after {1:?}")]
    Timeout(String, Duration),
    #[error("Command `{command}` failed with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("Command output was not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl ShellError {
    /// True when the failure means the program itself is unavailable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShellError::NotFound(_))
    }
}

/// An external command to run to completion.
///
/// The child gets a null stdin and a `C` locale so output is stable to parse.
#[derive(Debug, Clone)]
pub struct ShellCommand {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: Some(Duration::from_secs(30)),
        }
    }

    /// Builds a command from an argv vector. Returns `None` when `argv` is empty.
    pub fn from_argv<S: AsRef<str>>(argv: &[S]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.as_ref()).args(args))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<S: AsRef<str>>(mut self, args: &[S]) -> Self {
        self.args
            .extend(args.iter().map(|arg| arg.as_ref().to_string()));
        self
    }

    /// Run the command from this directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Kill the command if it has not exited after `timeout`. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Human-readable command line, for messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Execute the command and return its stdout with surrounding whitespace trimmed.
    ///
    /// # Notes
    ///
    /// The entire stdout is buffered in memory before being returned.
    pub fn run(&self) -> Result<String, ShellError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env("LC_ALL", "C")
            .env("LANG", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        debug!(command = %self.display(), cwd = ?self.cwd, "Running command");

        let mut child = cmd.spawn().map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => ShellError::NotFound(self.program.clone()),
            _ => ShellError::Io(err),
        })?;

        let stdout = drain(&mut child, Stream::Stdout);
        let stderr = drain(&mut child, Stream::Stderr);

        let status = match self.timeout {
            Some(duration) => match child.wait_timeout(duration)? {
                Some(status) => status,
                None => {
                    child.kill()?;
                    child.wait()?;
                    return Err(ShellError::Timeout(self.display(), duration));
                }
            },
            None => child.wait()?,
        };

        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;

        if !status.success() {
            return Err(ShellError::CommandFailed {
                command: self.display(),
                status,
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8(stdout)?.trim().to_string())
    }
}

enum Stream {
    Stdout,
    Stderr,
}

// Pipes are drained on their own threads so a chatty child never blocks on a
// full pipe buffer while we wait for it to exit.
fn drain(child: &mut Child, stream: Stream) -> Option<JoinHandle<std::io::Result<Vec<u8>>>> {
    let mut reader: Box<dyn Read + Send> = match stream {
        Stream::Stdout => Box::new(child.stdout.take()?),
        Stream::Stderr => Box::new(child.stderr.take()?),
    };
    Some(std::thread::spawn(move || {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Ok(buffer)
    }))
}

fn collect(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<Vec<u8>, ShellError> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| ShellError::Io(std::io::Error::other("output reader thread panicked")))?
            .map_err(ShellError::Io),
        None => Ok(Vec::new()),
    }
}
