use std::io::{self, BufRead, Write};

use tracing::debug;

/// Decides where the last name ends in a "Last First" name of three or more
/// tokens.
pub trait Disambiguator {
    /// Returns `k` such that `tokens[..k]` is the last name, or `None` when no
    /// answer can be given.
    fn split_point(&mut self, raw_form: &str, tokens: &[&str]) -> Option<usize>;
}

impl<D: Disambiguator + ?Sized> Disambiguator for Box<D> {
    fn split_point(&mut self, raw_form: &str, tokens: &[&str]) -> Option<usize> {
        (**self).split_point(raw_form, tokens)
    }
}

/// Batch mode: never answers, so the normalizer falls back and flags the name.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl Disambiguator for Unavailable {
    fn split_point(&mut self, _raw_form: &str, _tokens: &[&str]) -> Option<usize> {
        None
    }
}

/// Disambiguator backed by a closure. See [`from_fn`].
pub struct FromFn<F>(F);

/// Wraps a closure as a [`Disambiguator`].
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut(&str, &[&str]) -> Option<usize>,
{
    FromFn(f)
}

impl<F> Disambiguator for FromFn<F>
where
    F: FnMut(&str, &[&str]) -> Option<usize>,
{
    fn split_point(&mut self, raw_form: &str, tokens: &[&str]) -> Option<usize> {
        (self.0)(raw_form, tokens)
    }
}

/// Line-at-a-time input for [`TerminalPrompt`]. Implemented for `Stdin`
/// (locking only for the duration of each read) and for in-memory readers.
pub trait LineInput {
    /// Appends one line to `buf`; returns 0 at end of input.
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize>;
}

impl LineInput for io::Stdin {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        io::Stdin::read_line(self, buf)
    }
}

impl<T: AsRef<[u8]>> LineInput for io::Cursor<T> {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        BufRead::read_line(self, buf)
    }
}

impl<R: io::Read> LineInput for io::BufReader<R> {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        BufRead::read_line(self, buf)
    }
}

/// Asks on a terminal, listing every possible split. End of input means no
/// answer.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<io::Stdin, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin(), io::stdout())
    }
}

impl<R: LineInput, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, raw_form: &str, tokens: &[&str]) -> io::Result<Option<usize>> {
        let options = tokens.len() - 1;
        writeln!(self.output)?;
        writeln!(self.output, "Multiple-word name detected: {raw_form}")?;
        writeln!(
            self.output,
            "This name is in 'Last First' format. Where does the LAST name end?"
        )?;
        for split in 1..=options {
            let last = tokens[..split].join(" ");
            let first = tokens[split..].join(" ");
            writeln!(
                self.output,
                "{split}. Last: {last}, First: {first} -> {first} {last}"
            )?;
        }

        loop {
            write!(self.output, "Enter choice (1-{options}): ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            match line.trim().parse::<usize>() {
                Ok(choice) if (1..=options).contains(&choice) => {
                    let last = tokens[..choice].join(" ");
                    let first = tokens[choice..].join(" ");
                    writeln!(self.output, "Saved as: {first} {last}")?;
                    return Ok(Some(choice));
                }
                _ => writeln!(
                    self.output,
                    "Invalid choice. Please enter a number between 1 and {options}."
                )?,
            }
        }
    }
}

impl<R: LineInput, W: Write> Disambiguator for TerminalPrompt<R, W> {
    fn split_point(&mut self, raw_form: &str, tokens: &[&str]) -> Option<usize> {
        if tokens.len() < 2 {
            return None;
        }
        match self.ask(raw_form, tokens) {
            Ok(answer) => answer,
            Err(error) => {
                debug!(%error, "terminal prompt failed");
                None
            }
        }
    }
}
