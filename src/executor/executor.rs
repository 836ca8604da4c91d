use std::env;
use std::ffi::CString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use nix::errno::Errno;
use nix::unistd::execvp;

use crate::ast::{AstNode, BinOp};

use super::builtins::BuiltinSet;
use super::cancel::CancelToken;
use super::process::{self, STATUS_CANCELLED};

pub type ExecStatus = Result<i32, ExecError>;

// Structural and OS-level failures only. "The command failed" is not an
// error; it flows through as a nonzero exit status.
#[derive(Debug)]
pub enum ExecError {
    Unsupported(&'static str),
    PipelineTooShort,
    Io(io::Error),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Unsupported(what) => write!(f, "{} is not supported", what),
            ExecError::PipelineTooShort => {
                write!(f, "a pipeline needs at least two commands")
            }
            ExecError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ExecError {
    fn from(e: io::Error) -> Self {
        ExecError::Io(e)
    }
}

// Tree-walking executor. Owns everything it mutates: the builtin registry,
// the tracked working directory, and a cancellation token shared with
// whoever wants to interrupt a run.
pub struct Executor {
    builtins: BuiltinSet,
    cwd: PathBuf,
    cancel: CancelToken,
}

impl Executor {
    pub fn new(builtins: BuiltinSet, cancel: CancelToken) -> Self {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self {
            builtins,
            cwd,
            cancel,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn run(&mut self, node: &AstNode) -> ExecStatus {
        match node {
            AstNode::Command { name, args } => self.run_command(name, args),
            AstNode::Pipeline { stages } => {
                let cancel = self.cancel.clone();
                process::run_pipeline(stages, &cancel, |stage| self.run(stage))
            }
            AstNode::BinaryOp { op, left, right } => {
                let status = self.run(left)?;
                match op {
                    BinOp::And if status == 0 => self.run(right),
                    BinOp::Or if status != 0 => self.run(right),
                    // Short-circuit: the right side is skipped and the
                    // left status is the result.
                    BinOp::And | BinOp::Or => Ok(status),
                    BinOp::Seq => self.run(right),
                }
            }
            AstNode::Assignment => Err(ExecError::Unsupported("assignment")),
            AstNode::Redirection => Err(ExecError::Unsupported("redirection")),
            AstNode::Subshell => Err(ExecError::Unsupported("subshell")),
            AstNode::If => Err(ExecError::Unsupported("if")),
            AstNode::For => Err(ExecError::Unsupported("for")),
            AstNode::Case => Err(ExecError::Unsupported("case")),
        }
    }

    // Builtins shadow external binaries and never fork.
    fn run_command(&mut self, name: &str, args: &[String]) -> ExecStatus {
        if let Some(builtin) = self.builtins.get(name) {
            debug!("builtin: {} {:?}", name, args);
            return Ok(builtin.run(args, &mut self.cwd).unwrap_or(0));
        }
        if self.cancel.is_cancelled() {
            return Ok(STATUS_CANCELLED);
        }
        debug!("external: {} {:?}", name, args);
        let child = process::spawn(|| exec_external(name, args))?;
        child.wait()
    }
}

// Runs in the forked child; the return value becomes the child's exit
// code when execvp fails.
fn exec_external(name: &str, args: &[String]) -> i32 {
    let prog = match CString::new(name) {
        Ok(prog) => prog,
        Err(_) => {
            eprintln!("rayshell: {}: invalid command name", name);
            return 1;
        }
    };
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(prog.clone());
    for arg in args {
        match CString::new(arg.as_str()) {
            Ok(arg) => argv.push(arg),
            Err(_) => {
                eprintln!("rayshell: {}: argument contains NUL", name);
                return 1;
            }
        }
    }
    let errno = match execvp(&prog, &argv) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };
    if errno == Errno::ENOENT {
        eprintln!("rayshell: {}: command not found", name);
    } else {
        eprintln!("rayshell: {}: {}", name, errno.desc());
    }
    1
}
