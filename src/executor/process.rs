use std::io::{self, Write};
use std::os::fd::AsRawFd;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, dup2, fork, pipe};

use super::cancel::CancelToken;
use super::executor::{ExecError, ExecStatus};

// 128 + SIGINT, the conventional status for an interrupted command.
pub const STATUS_CANCELLED: i32 = 130;

// A forked child owned by the executor. Reaping consumes the handle, so a
// child cannot be waited on twice.
#[derive(Debug)]
pub struct ChildProc {
    pid: Pid,
}

impl ChildProc {
    pub fn wait(self) -> Result<i32, ExecError> {
        loop {
            match waitpid(self.pid, None) {
                Ok(WaitStatus::Exited(_, code)) => return Ok(code),
                Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(128 + signal as i32),
                Ok(_) => continue,
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(os_err(errno)),
            }
        }
    }

    pub fn terminate(&self) {
        // ESRCH here only means the child is already gone
        let _ = kill(self.pid, Signal::SIGTERM);
    }
}

// Fork, run `f` in the child, and exit the child with its return value.
pub fn spawn<F>(f: F) -> Result<ChildProc, ExecError>
where
    F: FnOnce() -> i32,
{
    // The child would inherit any unflushed stdout buffer
    io::stdout().flush().map_err(ExecError::Io)?;
    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            let code = f();
            child_exit(code);
        }
        Ok(ForkResult::Parent { child }) => Ok(ChildProc { pid: child }),
        Err(errno) => Err(os_err(errno)),
    }
}

// Wire up and run a pipeline of two or more stages. All pipes are created
// before the first fork. Stage i reads pipe i-1 and writes pipe i; every
// other pipe end is closed in the child, and the parent closes everything
// once the last stage is forked. Children are reaped in spawn order, so the
// returned status is the last stage's by position, regardless of which
// process exits first.
pub fn run_pipeline<T, F>(stages: &[T], cancel: &CancelToken, mut exec: F) -> ExecStatus
where
    F: FnMut(&T) -> ExecStatus,
{
    if stages.len() < 2 {
        return Err(ExecError::PipelineTooShort);
    }

    io::stdout().flush().map_err(ExecError::Io)?;

    let n = stages.len();
    let mut pipes = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        pipes.push(pipe().map_err(os_err)?);
    }

    let mut children: Vec<ChildProc> = Vec::with_capacity(n);
    for (i, stage) in stages.iter().enumerate() {
        if cancel.is_cancelled() {
            drop(pipes);
            reap_terminated(children);
            return Ok(STATUS_CANCELLED);
        }
        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                if i > 0 {
                    let _ = dup2(pipes[i - 1].0.as_raw_fd(), 0);
                }
                if i < n - 1 {
                    let _ = dup2(pipes[i].1.as_raw_fd(), 1);
                }
                // Closes every pipe end this stage holds; stdin/stdout keep
                // the two just wired in
                drop(pipes);
                let code = match exec(stage) {
                    Ok(code) => code,
                    Err(err) => {
                        eprintln!("rayshell: {}", err);
                        1
                    }
                };
                child_exit(code);
            }
            Ok(ForkResult::Parent { child }) => {
                children.push(ChildProc { pid: child });
            }
            Err(errno) => {
                // A half-wired pipeline cannot run; stop the stages that
                // already started and report the failure.
                drop(pipes);
                reap_terminated(children);
                return Err(os_err(errno));
            }
        }
    }

    // The parent takes no part in the data flow
    drop(pipes);

    let mut status = 0;
    for child in children {
        status = child.wait()?;
    }
    Ok(status)
}

fn reap_terminated(children: Vec<ChildProc>) {
    for child in &children {
        child.terminate();
    }
    for child in children {
        let _ = child.wait();
    }
}

fn child_exit(code: i32) -> ! {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
    unsafe { libc::_exit(code) }
}

fn os_err(errno: Errno) -> ExecError {
    ExecError::Io(io::Error::from_raw_os_error(errno as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_spawn_reports_child_exit_code() {
        let child = spawn(|| 7).unwrap();
        assert_eq!(child.wait().unwrap(), 7);
    }

    #[test]
    fn test_wait_maps_fatal_signal_to_128_plus_signo() {
        let child = spawn(|| {
            let _ = kill(Pid::this(), Signal::SIGTERM);
            0
        })
        .unwrap();
        assert_eq!(child.wait().unwrap(), 128 + Signal::SIGTERM as i32);
    }

    #[test]
    fn test_terminate_stops_a_running_child() {
        let child = spawn(|| {
            std::thread::sleep(Duration::from_secs(10));
            0
        })
        .unwrap();
        child.terminate();
        assert_eq!(child.wait().unwrap(), 143);
    }

    #[test]
    fn test_pipeline_needs_two_stages() {
        let result = run_pipeline(&[0], &CancelToken::new(), |_| Ok(0));
        assert!(matches!(result, Err(ExecError::PipelineTooShort)));
    }

    #[test]
    fn test_pipeline_status_is_last_stage_by_position() {
        // The first stage finishes last; a reap loop keyed on completion
        // order would report 9 instead of 4.
        let stages = [(50u64, 9), (0u64, 0), (10u64, 4)];
        let status = run_pipeline(&stages, &CancelToken::new(), |(ms, code)| {
            std::thread::sleep(Duration::from_millis(*ms));
            Ok(*code)
        })
        .unwrap();
        assert_eq!(status, 4);
    }

    #[test]
    fn test_cancelled_token_stops_pipeline_before_forking() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let status = run_pipeline(&[0, 1, 2], &cancel, |_| Ok(0)).unwrap();
        assert_eq!(status, STATUS_CANCELLED);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_pipeline_closes_every_descriptor() {
        let before = open_fd_count();
        let status = run_pipeline(&[0, 1, 2], &CancelToken::new(), |_| Ok(0)).unwrap();
        assert_eq!(status, 0);
        assert_eq!(open_fd_count(), before);
    }

    #[cfg(target_os = "linux")]
    fn open_fd_count() -> usize {
        std::fs::read_dir("/proc/self/fd")
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
