use std::io::{self, BufRead, IsTerminal, Write};

// Prompt and line input. The prompt is only printed when stdin is a
// terminal, so piped scripts get clean output.
pub struct Prompt {
    interactive: bool,
}

impl Prompt {
    pub fn new() -> Self {
        Self {
            interactive: io::stdin().is_terminal(),
        }
    }

    pub fn show(&self) -> io::Result<()> {
        if self.interactive {
            print!("rayshell> ");
            io::stdout().flush()?;
        }
        Ok(())
    }

    // Ok(None) on EOF (Ctrl-D).
    pub fn read_line(&self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        if io::stdin().lock().read_line(&mut buf)? == 0 {
            if self.interactive {
                println!();
            }
            return Ok(None);
        }
        Ok(Some(buf.trim_end().to_string()))
    }
}

impl Default for Prompt {
    fn default() -> Self {
        Self::new()
    }
}
