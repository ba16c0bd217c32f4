//! Line-oriented console for the conversation transcript.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// The user-facing side of the conversation.
pub trait Console {
    /// Print an assistant reply.
    fn show_assistant(&mut self, text: &str) -> io::Result<()>;

    /// Prompt for and read one line. `None` at end of input.
    fn read_user(&mut self) -> io::Result<Option<String>>;
}

/// Console over any reader/writer pair, normally stdin and stdout.
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

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: BufRead, W: Write> Console for StdConsole<R, W> {
    fn show_assistant(&mut self, text: &str) -> io::Result<()> {
        write!(self.output, "Assistant: {}\n\n", text)?;
        self.output.flush()
    }

    fn read_user(&mut self) -> io::Result<Option<String>> {
        write!(self.output, "User: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        writeln!(self.output)?;
        Ok(Some(line))
    }
}

/// Console that feeds queued lines and records what was shown.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    inputs: VecDeque<String>,
    shown: Vec<String>,
    reads: usize,
}

impl ScriptedConsole {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Assistant replies shown so far, in order.
    pub fn shown(&self) -> &[String] {
        &self.shown
    }

    /// Number of times input was requested, including the final end-of-input.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl Console for ScriptedConsole {
    fn show_assistant(&mut self, text: &str) -> io::Result<()> {
        self.shown.push(text.to_string());
        Ok(())
    }

    fn read_user(&mut self) -> io::Result<Option<String>> {
        self.reads += 1;
        Ok(self.inputs.pop_front())
    }
}
