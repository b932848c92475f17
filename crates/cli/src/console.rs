//! Line-based chat console.

use std::io::{self, BufRead, Write};

use runtime::{Backend, Orchestrator, ToolHost};

/// Inputs that end the session, compared case-insensitively.
const QUIT_TOKENS: [&str; 2] = ["quit", "exit"];

/// What a line of user input asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Quit,
    Blank,
    Query(&'a str),
}

pub fn parse_line(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        Input::Blank
    } else if QUIT_TOKENS.iter().any(|t| line.eq_ignore_ascii_case(t)) {
        Input::Quit
    } else {
        Input::Query(line)
    }
}

/// Read queries until a quit token or end of input, answering each one.
///
/// Returns the number of queries handed to the orchestrator. A failed turn
/// is printed as one `Error:` line and the loop goes on.
pub async fn run<R, W, B, H>(
    mut input: R,
    mut output: W,
    orchestrator: &mut Orchestrator<B, H>,
) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
    B: Backend,
    H: ToolHost,
{
    writeln!(output, "Type your queries or 'quit' to exit.")?;
    let mut turns = 0;

    loop {
        write!(output, "\nUser: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let query = match parse_line(&line) {
            Input::Quit => break,
            Input::Blank => continue,
            Input::Query(query) => query,
        };

        turns += 1;
        match orchestrator.process_query(query).await {
            Ok(answer) => writeln!(output, "Assistant: {answer}")?,
            Err(e) => writeln!(output, "Error: {e}")?,
        }
    }

    Ok(turns)
}
