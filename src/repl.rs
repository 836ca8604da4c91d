use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use log::{debug, warn};

use crate::config::Config;
use crate::error::ShellError;
use crate::executor::{BuiltinSet, CancelToken, Executor};
use crate::history::History;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::prompt::Prompt;

// One input line, end to end: tokenize, parse, execute.
pub fn run_line(executor: &mut Executor, line: &str) -> Result<i32, ShellError> {
    let tokens = Lexer::new(line).tokenize()?;
    debug!("{} tokens", tokens.len());
    let ast = Parser::new(&tokens).parse()?;
    Ok(executor.run(&ast)?)
}

pub struct Repl {
    executor: Executor,
    history: Rc<RefCell<History>>,
    history_path: PathBuf,
    last_status: Rc<Cell<i32>>,
}

impl Repl {
    pub fn new(config: &Config) -> Self {
        let history_path = config.history_path();
        let history = History::load(&history_path, config.history_max_len).unwrap_or_else(|e| {
            warn!("could not read {}: {}", history_path.display(), e);
            History::new(config.history_max_len)
        });
        let history = Rc::new(RefCell::new(history));
        let last_status = Rc::new(Cell::new(0));
        let builtins = BuiltinSet::with_defaults(history.clone(), last_status.clone());
        Self {
            executor: Executor::new(builtins, CancelToken::new()),
            history,
            history_path,
            last_status,
        }
    }

    // The interactive loop. Errors on a line are reported and the loop
    // continues; only EOF or a read failure leaves it. Returns the last
    // command's status.
    pub fn run(&mut self) -> i32 {
        let prompt = Prompt::new();
        loop {
            if prompt.show().is_err() {
                break;
            }
            let line = match prompt.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    eprintln!("rayshell: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            self.history.borrow_mut().add(&line);
            self.eval(&line);
        }
        self.save_history();
        self.last_status.get()
    }

    // The -c path: one line, no prompt, no history.
    pub fn run_command(&mut self, line: &str) -> i32 {
        self.eval(line);
        self.last_status.get()
    }

    fn eval(&mut self, line: &str) {
        match run_line(&mut self.executor, line) {
            Ok(status) => self.last_status.set(status),
            Err(e) => {
                eprintln!("rayshell: {}", e);
                self.last_status.set(e.status());
            }
        }
    }

    fn save_history(&self) {
        if let Err(e) = self.history.borrow().save(&self.history_path) {
            warn!("could not save {}: {}", self.history_path.display(), e);
        }
    }
}
