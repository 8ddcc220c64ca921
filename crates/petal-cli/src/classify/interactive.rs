//! Line-oriented classification session.
use anyhow::Result;
use std::io::{BufRead, Write};
use std::str::FromStr;

use petal_classifiers::descriptors::DescriptorKind;
use petal_classifiers::session::{ClassifierSession, SessionState};

use super::inference::format_prediction;

const HELP: &str = "\
Commands:
  descriptors      list the models that can be selected
  use <name>       select a model (hog, lab)
  open <path>      load an image
  classify         classify the loaded image
  <path>           open and classify an image in one step
  status           show the current selection
  help             show this message
  quit             leave the session";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Descriptors,
    Use(&'a str),
    Open(&'a str),
    Classify,
    OpenAndClassify(&'a str),
    Status,
    Help,
    Quit,
    Empty,
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    match head.to_lowercase().as_str() {
        "" => Command::Empty,
        "descriptors" | "models" => Command::Descriptors,
        "use" | "select" => Command::Use(rest),
        "open" | "load" => Command::Open(rest),
        "classify" | "run" => Command::Classify,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::OpenAndClassify(line),
    }
}

/// Drive `session` from `input` until `quit` or end of input. Failed
/// commands are reported on `output` and the session carries on.
pub fn run_interactive<R: BufRead, W: Write>(
    session: &mut ClassifierSession,
    input: R,
    mut output: W,
    top_k: usize,
) -> Result<()> {
    writeln!(output, "{}", HELP)?;
    write_status(session, &mut output)?;

    for line in input.lines() {
        let line = line?;
        match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Help => writeln!(output, "{}", HELP)?,
            Command::Status => write_status(session, &mut output)?,
            Command::Descriptors => {
                for kind in DescriptorKind::ALL {
                    let mark = if session.registry().is_available(kind) {
                        "available"
                    } else {
                        "not available"
                    };
                    writeln!(output, "  {} ({})", kind, mark)?;
                }
            }
            Command::Use(name) => {
                let result = DescriptorKind::from_str(name).and_then(|kind| session.select_descriptor(kind));
                match result {
                    Ok(()) => writeln!(output, "Using {}", session.descriptor())?,
                    Err(e) => writeln!(output, "Error: {}", e)?,
                }
            }
            Command::Open(path) => match session.open_image(path) {
                Ok(_) => writeln!(output, "Image loaded: {}", path)?,
                Err(e) => writeln!(output, "Error: {}", e)?,
            },
            Command::Classify => match session.classify() {
                Ok(prediction) => writeln!(output, "{}", format_prediction(prediction, top_k))?,
                Err(e) => writeln!(output, "Error: {}", e)?,
            },
            Command::OpenAndClassify(path) => match session.open_and_classify(path) {
                Ok(prediction) => writeln!(output, "{}", format_prediction(prediction, top_k))?,
                Err(e) => writeln!(output, "Error: {}", e)?,
            },
        }
        output.flush()?;
    }
    Ok(())
}

fn write_status<W: Write>(session: &ClassifierSession, output: &mut W) -> Result<()> {
    let state = match session.state() {
        SessionState::Idle => "no image loaded",
        SessionState::ImageLoaded => "image loaded",
        SessionState::Classified => "classified",
    };
    writeln!(output, "Model: {} | {}", session.descriptor(), state)?;
    if let Some(path) = session.image_path() {
        writeln!(output, "Image: {}", path.display())?;
    }
    if let Some(error) = session.last_error() {
        writeln!(output, "Last error: {}", error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_bare_paths() {
        assert_eq!(parse_command("  USE lab "), Command::Use("lab"));
        assert_eq!(parse_command("open my image.png"), Command::Open("my image.png"));
        assert_eq!(parse_command("classify"), Command::Classify);
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(parse_command("exit"), Command::Quit);
        assert_eq!(parse_command("flowers/rose.jpg"), Command::OpenAndClassify("flowers/rose.jpg"));
    }
}
