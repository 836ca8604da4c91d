use std::env;
use std::process;

use simplelog::{ColorChoice, TermLogger, TerminalMode};

use rayshell::config::Config;
use rayshell::repl::Repl;

enum Mode {
    Interactive,
    Command(String),
    Help,
}

fn usage_text() -> &'static str {
    "Usage: rayshell [-c <command>]\n\
     \x20 -c <command>  Run one command line and exit with its status\n\
     \x20 -h, --help    Print this help"
}

fn parse_args(args: &[String]) -> Result<Mode, String> {
    let mut iter = args.iter().skip(1);
    let mode = match iter.next().map(|s| s.as_str()) {
        None => Mode::Interactive,
        Some("-h") | Some("--help") => Mode::Help,
        Some("-c") => match iter.next() {
            Some(line) => Mode::Command(line.clone()),
            None => return Err("option -c requires an argument".to_string()),
        },
        Some(flag) if flag.starts_with('-') => {
            return Err(format!("unknown option '{}'", flag));
        }
        Some(arg) => {
            return Err(format!("script arguments are not supported: '{}'", arg));
        }
    };
    if let Some(extra) = iter.next() {
        return Err(format!("unexpected argument '{}'", extra));
    }
    Ok(mode)
}

fn init_logger(config: &Config) {
    let _ = TermLogger::init(
        config.log_level_filter(),
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mode = match parse_args(&args) {
        Ok(mode) => mode,
        Err(msg) => {
            eprintln!("rayshell: {}", msg);
            eprintln!("{}", usage_text());
            process::exit(2);
        }
    };
    if let Mode::Help = mode {
        println!("{}", usage_text());
        return;
    }

    let config = Config::load();
    init_logger(&config);

    let mut repl = Repl::new(&config);
    let status = match mode {
        Mode::Command(line) => repl.run_command(&line),
        Mode::Interactive | Mode::Help => repl.run(),
    };
    process::exit(status);
}
