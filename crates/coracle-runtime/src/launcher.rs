//! Parent-side container launch protocol.
//!
//! The parent clones a child into fresh namespaces; the child re-invokes
//! this binary's hidden `init` entry point, which receives its command
//! line over a one-shot anonymous pipe. Handing the command over a pipe
//! rather than as process arguments keeps it out of `/proc` cmdline
//! inspection, lifts argument-length limits, and lets the init side finish
//! its in-namespace setup before user code starts.

use std::fs::OpenOptions;
use std::io::Write;
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd};
use std::path::{Path, PathBuf};

use coracle_common::constants::CONTAINER_LOG_FILE;
use coracle_common::error::{CoracleError, Result};
use nix::sched::{CloneFlags, clone};
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{Pid, pipe};

/// File descriptor number on which the init process finds the read end of
/// the command pipe after exec.
pub const INIT_PIPE_FD: i32 = 3;

/// Stack size handed to `clone(2)` for the container child.
const CHILD_STACK_SIZE: usize = 1024 * 1024;

/// Write end of the one-shot command pipe.
///
/// Consuming [`Self::send_command`] closes the pipe, so the init side sees
/// end-of-stream after exactly one message.
#[derive(Debug)]
pub struct InitPipe {
    write: OwnedFd,
}

impl InitPipe {
    pub(crate) const fn new(write: OwnedFd) -> Self {
        Self { write }
    }

    /// Joins `argv` with single spaces and writes it as the one and only
    /// message, then closes the write end.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipe write fails.
    pub fn send_command(self, argv: &[String]) -> Result<()> {
        let command = argv.join(" ");
        tracing::info!(%command, "sending init command");
        let mut file = std::fs::File::from(self.write);
        file.write_all(command.as_bytes())
            .map_err(|e| CoracleError::Setup {
                message: format!("writing init command failed: {e}"),
            })
        // file drops here, closing the write end and signalling EOF.
    }
}

/// A container child process: created unstarted, then cloned into its
/// namespaces by [`Self::start`].
#[derive(Debug)]
pub struct ParentProcess {
    name: String,
    image: String,
    volume: Option<String>,
    tty: bool,
    log_path: PathBuf,
    init_pipe_read: Option<OwnedFd>,
    init_pipe_write_fd: i32,
    pid: Option<Pid>,
}

impl ParentProcess {
    /// Returns the image the container was launched from.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Returns the volume specification, if any.
    #[must_use]
    pub fn volume(&self) -> Option<&str> {
        self.volume.as_deref()
    }

    /// Returns the child pid once started.
    #[must_use]
    pub const fn pid(&self) -> Option<Pid> {
        self.pid
    }

    /// Spawns the container child via `clone(2)` with fresh PID, mount,
    /// UTS, IPC, and network namespaces.
    ///
    /// The child closes its inherited copy of the pipe write end (so the
    /// parent's close is the one init observes as end-of-stream), dup2s
    /// the read end onto fd 3, redirects its stdio into the container log
    /// file when detached, and execs `/proc/self/exe init`.
    ///
    /// # Errors
    ///
    /// Returns a setup error if the process was already started or the
    /// clone syscall fails.
    pub fn start(&mut self) -> Result<Pid> {
        let read_fd = self
            .init_pipe_read
            .take()
            .ok_or_else(|| CoracleError::Setup {
                message: "container process already started".into(),
            })?;

        let tty = self.tty;
        let log_path = self.log_path.clone();
        let raw_read_fd = read_fd.as_raw_fd();
        let raw_write_fd = self.init_pipe_write_fd;

        let mut stack = vec![0u8; CHILD_STACK_SIZE];
        let flags = CloneFlags::CLONE_NEWUTS
            | CloneFlags::CLONE_NEWPID
            | CloneFlags::CLONE_NEWNS
            | CloneFlags::CLONE_NEWNET
            | CloneFlags::CLONE_NEWIPC;

        // SAFETY: the child callback only execs after adjusting its own
        // file descriptors; it never unwinds back into parent state.
        let pid = unsafe {
            clone(
                Box::new(move || child_entry(raw_read_fd, raw_write_fd, tty, &log_path)),
                &mut stack,
                flags,
                Some(Signal::SIGCHLD as i32),
            )
        }
        .map_err(|e| CoracleError::Setup {
            message: format!("cloning container process failed: {e}"),
        })?;

        // The child holds its own copy; closing ours lets the pipe EOF
        // once the write end is dropped.
        drop(read_fd);

        self.pid = Some(pid);
        tracing::info!(name = %self.name, pid = pid.as_raw(), "container process cloned");
        Ok(pid)
    }

    /// Blocks until the child terminates, returning its exit code.
    ///
    /// Only attached (tty) containers are waited on; detached ones run
    /// supervised by the OS alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the process was never started or `waitpid`
    /// fails.
    pub fn wait(&self) -> Result<i32> {
        let pid = self.pid.ok_or_else(|| CoracleError::Setup {
            message: "cannot wait on a container that was never started".into(),
        })?;
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => Ok(code),
            Ok(status) => {
                tracing::debug!(?status, "container terminated without exit code");
                Ok(-1)
            }
            Err(e) => Err(CoracleError::Setup {
                message: format!("waiting for container failed: {e}"),
            }),
        }
    }
}

/// Builds an unstarted container process plus the write end of its
/// one-shot command pipe.
///
/// For detached containers the per-container directory is created eagerly
/// so the child can open its log file before exec.
///
/// # Errors
///
/// Returns a hard setup error if the pipe cannot be created or the log
/// directory cannot be prepared; the caller must abort the run.
pub fn new_parent_process(
    tty: bool,
    name: &str,
    image: &str,
    volume: Option<&str>,
    containers_dir: &Path,
) -> Result<(ParentProcess, InitPipe)> {
    let (read, write) = pipe().map_err(|e| CoracleError::Setup {
        message: format!("creating init pipe failed: {e}"),
    })?;

    let container_dir = containers_dir.join(name);
    if !tty {
        std::fs::create_dir_all(&container_dir).map_err(|e| CoracleError::Io {
            path: container_dir.clone(),
            source: e,
        })?;
    }

    let parent = ParentProcess {
        name: name.to_string(),
        image: image.to_string(),
        volume: volume.map(str::to_string),
        tty,
        log_path: container_dir.join(CONTAINER_LOG_FILE),
        init_pipe_read: Some(read),
        init_pipe_write_fd: write.as_raw_fd(),
        pid: None,
    };
    Ok((parent, InitPipe::new(write)))
}

/// Entry point of the cloned child, running before exec. Must only return
/// a process exit status.
fn child_entry(read_fd: i32, write_fd: i32, tty: bool, log_path: &Path) -> isize {
    // The clone leaves this child holding its own copy of the pipe write
    // end; it must go away here, or the pipe stays open after the parent
    // sends the command and init's read-to-EOF never finishes.
    // SAFETY: write_fd is the inherited pipe write end, unused by the
    // child.
    unsafe {
        let _ = libc::close(write_fd);
    }

    if !tty && redirect_stdio_to_log(log_path).is_err() {
        return 1;
    }

    if read_fd != INIT_PIPE_FD {
        // SAFETY: both descriptors are valid in the child; dup2 is
        // async-signal-safe.
        if unsafe { libc::dup2(read_fd, INIT_PIPE_FD) } < 0 {
            return 1;
        }
        // SAFETY: the read end now lives on INIT_PIPE_FD; the original
        // number must not leak into the exec'd init.
        unsafe {
            let _ = libc::close(read_fd);
        }
    }

    let Ok(exe) = std::ffi::CString::new("/proc/self/exe") else {
        return 1;
    };
    let Ok(subcommand) = std::ffi::CString::new("init") else {
        return 1;
    };
    // execv only returns on failure.
    let _ = nix::unistd::execv(&exe, &[exe.as_c_str(), subcommand.as_c_str()]);
    1
}

/// Points stdout and stderr of a detached child at its log file.
fn redirect_stdio_to_log(log_path: &Path) -> std::io::Result<()> {
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    let log_fd = log.into_raw_fd();
    for target in [libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        // SAFETY: log_fd is a freshly opened, valid descriptor.
        if unsafe { libc::dup2(log_fd, target) } < 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn init_pipe_delivers_one_message_then_eof() {
        let (read, write) = pipe().expect("pipe");
        let init_pipe = InitPipe { write };
        init_pipe
            .send_command(&["echo".into(), "hi".into()])
            .expect("send");

        let mut reader = std::fs::File::from(read);
        let mut message = String::new();
        let n = reader.read_to_string(&mut message).expect("read");
        assert_eq!(message, "echo hi");
        assert_eq!(n, 6);

        // The write end is closed: a second read observes end-of-stream.
        let mut rest = String::new();
        assert_eq!(reader.read_to_string(&mut rest).expect("read eof"), 0);
        assert!(rest.is_empty());
    }

    #[test]
    fn parent_process_starts_unstarted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (parent, _pipe) =
            new_parent_process(true, "demo", "busybox", None, dir.path()).expect("parent");
        assert!(parent.pid().is_none());
        assert_eq!(parent.image(), "busybox");
        assert!(parent.volume().is_none());
    }

    #[test]
    fn detached_parent_prepares_log_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (_parent, _pipe) =
            new_parent_process(false, "bg", "busybox", Some("/data:/data"), dir.path())
                .expect("parent");
        assert!(dir.path().join("bg").is_dir());
    }

    #[test]
    fn forked_child_sees_eof_after_single_send() {
        use nix::sys::wait::WaitPidFlag;
        use nix::unistd::{ForkResult, fork};

        let (read, write) = pipe().expect("pipe");
        let raw_read = read.as_raw_fd();
        let raw_write = write.as_raw_fd();

        // The fork leaves the child with inherited copies of both pipe
        // ends, the same descriptor picture a cloned container child
        // starts from.
        match unsafe { fork() }.expect("fork") {
            ForkResult::Child => {
                // Same hygiene as child_entry: the inherited write end
                // goes first, otherwise the read below never unblocks.
                unsafe {
                    let _ = libc::close(raw_write);
                }
                let mut buf = [0u8; 64];
                let mut total: isize = 0;
                loop {
                    let n = unsafe { libc::read(raw_read, buf.as_mut_ptr().cast(), buf.len()) };
                    if n <= 0 {
                        break;
                    }
                    total += n;
                }
                // "echo hi" is 7 bytes.
                unsafe { libc::_exit(i32::from(total != 7)) };
            }
            ForkResult::Parent { child } => {
                drop(read);
                InitPipe::new(write)
                    .send_command(&["echo".into(), "hi".into()])
                    .expect("send");

                let deadline =
                    std::time::Instant::now() + std::time::Duration::from_secs(5);
                loop {
                    match waitpid(child, Some(WaitPidFlag::WNOHANG)).expect("waitpid") {
                        WaitStatus::StillAlive => {
                            assert!(
                                std::time::Instant::now() < deadline,
                                "child never observed end-of-stream on the command pipe"
                            );
                            std::thread::sleep(std::time::Duration::from_millis(10));
                        }
                        WaitStatus::Exited(_, code) => {
                            assert_eq!(code, 0, "child read an unexpected message");
                            break;
                        }
                        status => panic!("unexpected wait status: {status:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn wait_before_start_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (parent, _pipe) =
            new_parent_process(true, "demo", "busybox", None, dir.path()).expect("parent");
        assert!(parent.wait().is_err());
    }
}
