use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use crate::history::History;

// A command that runs in-process, before PATH lookup. Returning None
// means "no status", which the executor treats as success.
pub trait Builtin {
    fn name(&self) -> &'static str;
    fn run(&self, args: &[String], cwd: &mut PathBuf) -> Option<i32>;
}

pub struct BuiltinSet {
    commands: HashMap<&'static str, Box<dyn Builtin>>,
}

impl BuiltinSet {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    // The standard set: cd, pwd, exit, help, history. The history list and
    // the last exit status are shared with the REPL.
    pub fn with_defaults(history: Rc<RefCell<History>>, last_status: Rc<Cell<i32>>) -> Self {
        let mut set = Self::new();
        set.register(Box::new(Cd));
        set.register(Box::new(Pwd));
        set.register(Box::new(Exit { last_status }));
        set.register(Box::new(Help));
        set.register(Box::new(HistoryList { history }));
        set
    }

    pub fn register(&mut self, builtin: Box<dyn Builtin>) {
        self.commands.insert(builtin.name(), builtin);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Builtin> {
        self.commands.get(name).map(|b| b.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for BuiltinSet {
    fn default() -> Self {
        Self::new()
    }
}

struct Cd;

impl Builtin for Cd {
    fn name(&self) -> &'static str {
        "cd"
    }
    fn run(&self, args: &[String], cwd: &mut PathBuf) -> Option<i32> {
        let target = match args.first() {
            Some(dir) => dir.clone(),
            None => env::var("HOME").unwrap_or_else(|_| "/".to_string()),
        };
        if let Err(e) = env::set_current_dir(&target) {
            eprintln!("rayshell: cd: {}: {}", target, e);
            return Some(1);
        }
        if let Ok(dir) = env::current_dir() {
            *cwd = dir;
        }
        Some(0)
    }
}

struct Pwd;

impl Builtin for Pwd {
    fn name(&self) -> &'static str {
        "pwd"
    }
    fn run(&self, _args: &[String], cwd: &mut PathBuf) -> Option<i32> {
        println!("{}", cwd.display());
        Some(0)
    }
}

struct Exit {
    last_status: Rc<Cell<i32>>,
}

impl Builtin for Exit {
    fn name(&self) -> &'static str {
        "exit"
    }
    fn run(&self, args: &[String], _cwd: &mut PathBuf) -> Option<i32> {
        let code = args
            .first()
            .and_then(|s| s.parse::<i32>().ok())
            .unwrap_or_else(|| self.last_status.get());
        // Piped output would be lost to block buffering otherwise
        let _ = io::stdout().flush();
        std::process::exit(code);
    }
}

struct Help;

impl Builtin for Help {
    fn name(&self) -> &'static str {
        "help"
    }
    fn run(&self, _args: &[String], _cwd: &mut PathBuf) -> Option<i32> {
        println!("Built-in commands:");
        println!("  cd [DIR]   Change the working directory (default: $HOME)");
        println!("  pwd        Print the working directory");
        println!("  exit [N]   Exit the shell (default: last status)");
        println!("  help       Show this help");
        println!("  history    Show the command history");
        Some(0)
    }
}

struct HistoryList {
    history: Rc<RefCell<History>>,
}

impl Builtin for HistoryList {
    fn name(&self) -> &'static str {
        "history"
    }
    fn run(&self, _args: &[String], _cwd: &mut PathBuf) -> Option<i32> {
        for (i, line) in self.history.borrow().list().iter().enumerate() {
            println!("{:>4}  {}", i + 1, line);
        }
        Some(0)
    }
}
