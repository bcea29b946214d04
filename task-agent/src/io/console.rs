//! User-facing terminal I/O.
//!
//! The [`Console`] trait keeps the session loop independent of the real
//! terminal so tests can script answers and capture output.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

pub trait Console {
    /// Print one line of product output.
    fn say(&mut self, text: &str) -> Result<()>;

    /// Show `prompt` and read one line of input without its line ending.
    ///
    /// Returns `None` once input is exhausted.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Console over any reader/writer pair; [`StdConsole::stdio`] binds the
/// process stdin and stdout.
pub struct StdConsole<R, W> {
    input: R,
    output: W,
}

impl StdConsole<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StdConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Console for StdConsole<R, W> {
    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}").context("write stdout")?;
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}").context("write prompt")?;
        self.output.flush().context("flush stdout")?;

        let mut line = String::new();
        let n = self.input.read_line(&mut line).context("read stdin")?;
        if n == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }
}
