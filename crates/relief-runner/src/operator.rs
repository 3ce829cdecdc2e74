//! Operator acknowledgment.
//!
//! Interactive runs pause on failures and at the end until the operator
//! presses Enter. Unattended runs use [`AutoAcknowledge`].

use std::io::{self, BufRead, Write};
use tracing::debug;

/// Something that can be told about an event and must confirm it.
pub trait Operator {
    /// Show `message` and block until acknowledged.
    fn acknowledge(&mut self, message: &str);
}

/// Prompts on stderr and waits for a line on stdin.
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl Operator for ConsolePrompt {
    fn acknowledge(&mut self, message: &str) {
        if let Err(e) = prompt(io::stdin().lock(), io::stderr().lock(), message) {
            debug!(error = %e, message, "Prompt not shown, continuing");
        }
    }
}

/// Write `message` to `output` and wait for one line of `input`.
fn prompt<R: BufRead, W: Write>(mut input: R, mut output: W, message: &str) -> io::Result<()> {
    write!(output, "{} [press Enter] ", message)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}

/// Never blocks.
#[derive(Debug, Default)]
pub struct AutoAcknowledge;

impl Operator for AutoAcknowledge {
    fn acknowledge(&mut self, message: &str) {
        debug!(message, "Acknowledged automatically");
    }
}

/// Pick the operator for a run.
pub fn operator_for(interactive: bool) -> Box<dyn Operator> {
    if interactive {
        Box::new(ConsolePrompt)
    } else {
        Box::new(AutoAcknowledge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_prompt_waits_for_line() {
        let mut output = Vec::new();
        let mut input = Cursor::new(b"\nrest".to_vec());
        prompt(&mut input, &mut output, "Done.").unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "Done. [press Enter] ");
        assert_eq!(input.position(), 1);
    }

    #[test]
    fn test_prompt_reports_write_failure() {
        let err = prompt(Cursor::new(Vec::new()), ClosedPipe, "Done.").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
