//! Implements the parsing of plan and layout files.
//!
//! Both formats are line based: the readers work line-by-line, skipping empty lines, and
//! report errors with the line number and a description of what went wrong.

use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::iter::Peekable;
use std::str::Chars;

use crate::NodeLine;
use crate::PlanAction;

/// The errors that can be encountered while reading a plan or layout file.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("failed to read from source: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse line {line_nr}: {reason}")]
    Parse { line_nr: usize, reason: String },
}

/// Used to read and parse plan files.
///
/// The reader does not validate the plan beyond its syntax; binding the action names to actual
/// elements is the consumer's job.
///
/// # Example
/// ```
/// use rplan_format::reader::PlanReader;
/// use rplan_format::PlanAction;
///
/// let source = "startup(n9,0,1)\nmigrate(vm3,n1,n4,1,2)\n";
/// let mut reader = PlanReader::new(source.as_bytes());
///
/// let first = reader.next_action().unwrap();
/// assert_eq!(
///     first,
///     Some(PlanAction::Startup { node: "n9".to_owned(), start: 0, end: 1 })
/// );
/// ```
#[derive(Debug)]
pub struct PlanReader<R: Read> {
    reader: BufReader<R>,
    line_nr: usize,
}

impl<R: Read> PlanReader<R> {
    pub fn new(source: R) -> Self {
        PlanReader {
            reader: BufReader::new(source),
            line_nr: 0,
        }
    }

    /// Parses the next action, or returns `None` when the source is exhausted.
    pub fn next_action(&mut self) -> Result<Option<PlanAction>, ReadError> {
        loop {
            let Some(line) = next_line(&mut self.reader, &mut self.line_nr)? else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }
            return LineParser::new(&line, self.line_nr).parse_action().map(Some);
        }
    }
}

/// Used to read and parse configuration layout files.
#[derive(Debug)]
pub struct LayoutReader<R: Read> {
    reader: BufReader<R>,
    line_nr: usize,
}

impl<R: Read> LayoutReader<R> {
    pub fn new(source: R) -> Self {
        LayoutReader {
            reader: BufReader::new(source),
            line_nr: 0,
        }
    }

    /// Parses the next node line, or returns `None` when the source is exhausted.
    pub fn next_node(&mut self) -> Result<Option<NodeLine>, ReadError> {
        loop {
            let Some(line) = next_line(&mut self.reader, &mut self.line_nr)? else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }
            return LineParser::new(&line, self.line_nr).parse_node_line().map(Some);
        }
    }
}

fn next_line<R: Read>(
    reader: &mut BufReader<R>,
    line_nr: &mut usize,
) -> Result<Option<String>, ReadError> {
    let mut line = String::new();
    let num_read = reader.read_line(&mut line)?;
    if num_read == 0 {
        return Ok(None);
    }
    *line_nr += 1;
    Ok(Some(line))
}

/// Parses a single line of either format.
struct LineParser<'src> {
    characters: Peekable<Chars<'src>>,
    line_nr: usize,
}

/// A name token together with whether any of its characters were escaped; the layout format
/// needs the distinction to tell the `:` separator from a node literally named `:`.
struct Token {
    text: String,
    had_escape: bool,
}

impl<'src> LineParser<'src> {
    fn new(line: &'src str, line_nr: usize) -> Self {
        LineParser {
            characters: line.trim_end_matches('\n').chars().peekable(),
            line_nr,
        }
    }

    fn error(&self, reason: impl Into<String>) -> ReadError {
        ReadError::Parse {
            line_nr: self.line_nr,
            reason: reason.into(),
        }
    }

    /// Parses `kind(arg,...,start,end)`.
    fn parse_action(mut self) -> Result<PlanAction, ReadError> {
        let keyword = self.identifier()?;
        self.expect('(')?;

        let mut arguments = Vec::new();
        loop {
            arguments.push(self.argument(&[',', ')'])?);
            match self.characters.next() {
                Some(',') => {}
                Some(')') => break,
                _ => return Err(self.error("expected ',' or ')'")),
            }
        }
        if self.characters.any(|character| !character.is_whitespace()) {
            return Err(self.error("trailing content after ')'"));
        }

        if arguments.len() < 3 {
            return Err(self.error("an action needs at least one name and its interval"));
        }
        let end = self.integer(&arguments[arguments.len() - 1])?;
        let start = self.integer(&arguments[arguments.len() - 2])?;
        let names = &arguments[..arguments.len() - 2];

        let action = match (keyword.as_str(), names) {
            ("run", [vm, host]) => PlanAction::Run {
                vm: vm.clone(),
                host: host.clone(),
                start,
                end,
            },
            ("migrate", [vm, from, to]) => PlanAction::Migrate {
                vm: vm.clone(),
                from: from.clone(),
                to: to.clone(),
                start,
                end,
            },
            ("startup", [node]) => PlanAction::Startup {
                node: node.clone(),
                start,
                end,
            },
            ("shutdown", [node]) => PlanAction::Shutdown {
                node: node.clone(),
                start,
                end,
            },
            ("suspend", [vm, on]) => PlanAction::Suspend {
                vm: vm.clone(),
                on: on.clone(),
                start,
                end,
            },
            ("resume", [vm, from, to]) => PlanAction::Resume {
                vm: vm.clone(),
                from: from.clone(),
                to: to.clone(),
                start,
                end,
            },
            ("stop", [vm, on]) => PlanAction::Stop {
                vm: vm.clone(),
                on: on.clone(),
                start,
                end,
            },
            (keyword, names) => {
                return Err(self.error(format!(
                    "unknown action '{keyword}' with {} names",
                    names.len()
                )))
            }
        };
        Ok(action)
    }

    /// Parses `name : vm...`.
    fn parse_node_line(mut self) -> Result<NodeLine, ReadError> {
        let Token { text, had_escape } = self
            .token()?
            .ok_or_else(|| self.error("expected a node name"))?;

        // The separator is a bare, unescaped colon; it may also be glued to the node name.
        let (node, separator_seen) = if !had_escape && text.ends_with(':') {
            let mut text = text;
            text.truncate(text.len() - 1);
            (text, true)
        } else {
            (text, false)
        };
        if !separator_seen {
            let separator = self
                .token()?
                .ok_or_else(|| self.error("expected ':' after the node name"))?;
            if separator.text != ":" || separator.had_escape {
                return Err(self.error("expected ':' after the node name"));
            }
        }

        let mut vms = Vec::new();
        while let Some(token) = self.token()? {
            vms.push(token.text);
        }
        Ok(NodeLine { node, vms })
    }

    fn identifier(&mut self) -> Result<String, ReadError> {
        let mut identifier = String::new();
        while let Some(&character) = self.characters.peek() {
            if character.is_ascii_alphabetic() {
                identifier.push(character);
                let _ = self.characters.next();
            } else {
                break;
            }
        }
        if identifier.is_empty() {
            return Err(self.error("expected an action keyword"));
        }
        Ok(identifier)
    }

    fn expect(&mut self, expected: char) -> Result<(), ReadError> {
        match self.characters.next() {
            Some(character) if character == expected => Ok(()),
            _ => Err(self.error(format!("expected '{expected}'"))),
        }
    }

    /// Reads a possibly escaped name up to (but not consuming) one of the delimiters.
    fn argument(&mut self, delimiters: &[char]) -> Result<String, ReadError> {
        let mut argument = String::new();
        while let Some(&character) = self.characters.peek() {
            if character == '\\' {
                let _ = self.characters.next();
                let escaped = self
                    .characters
                    .next()
                    .ok_or_else(|| self.error("dangling escape at end of line"))?;
                argument.push(escaped);
            } else if delimiters.contains(&character) {
                break;
            } else {
                argument.push(character);
                let _ = self.characters.next();
            }
        }
        Ok(argument)
    }

    /// Reads the next whitespace-separated, escape-aware token of a layout line.
    fn token(&mut self) -> Result<Option<Token>, ReadError> {
        while self
            .characters
            .peek()
            .is_some_and(|character| character.is_whitespace())
        {
            let _ = self.characters.next();
        }
        if self.characters.peek().is_none() {
            return Ok(None);
        }

        let mut text = String::new();
        let mut had_escape = false;
        while let Some(&character) = self.characters.peek() {
            if character.is_whitespace() {
                break;
            }
            if character == '\\' {
                had_escape = true;
                let _ = self.characters.next();
                let escaped = self
                    .characters
                    .next()
                    .ok_or_else(|| self.error("dangling escape at end of line"))?;
                text.push(escaped);
            } else {
                text.push(character);
                let _ = self.characters.next();
            }
        }
        Ok(Some(Token { text, had_escape }))
    }

    fn integer(&self, text: &str) -> Result<u32, ReadError> {
        text.parse()
            .map_err(|_| self.error(format!("expected an integer, got '{text}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::LayoutWriter;
    use crate::writer::PlanWriter;

    #[test]
    fn parses_every_action_kind() {
        let source = "\
run(vm1,n1,0,1)
migrate(vm3,n1,n4,0,5)
startup(n9,0,1)
shutdown(n7,1,2)
suspend(vm4,n2,0,1)
resume(vm5,n3,n6,1,2)
stop(vm7,n1,0,1)
";
        let mut reader = PlanReader::new(source.as_bytes());
        let mut actions = Vec::new();
        while let Some(action) = reader.next_action().expect("the plan is well-formed") {
            actions.push(action);
        }
        assert_eq!(actions.len(), 7);
        assert_eq!(
            actions[1],
            PlanAction::Migrate {
                vm: "vm3".to_owned(),
                from: "n1".to_owned(),
                to: "n4".to_owned(),
                start: 0,
                end: 5,
            }
        );
    }

    #[test]
    fn escaped_names_round_trip() {
        let action = PlanAction::Run {
            vm: "awk ward,name(1)".to_owned(),
            host: "rack\\7".to_owned(),
            start: 2,
            end: 3,
        };

        let mut sink: Vec<u8> = Vec::new();
        let mut writer = PlanWriter::new(&mut sink);
        writer.write_action(&action).expect("writing to memory");
        writer.finish().expect("flushing to memory");

        let mut reader = PlanReader::new(sink.as_slice());
        let parsed = reader.next_action().expect("the plan is well-formed");
        assert_eq!(parsed, Some(action));
    }

    #[test]
    fn malformed_lines_are_reported_with_their_number() {
        let source = "startup(n1,0,1)\nnonsense\n";
        let mut reader = PlanReader::new(source.as_bytes());
        let _ = reader.next_action().expect("the first line is fine");

        let error = reader.next_action().expect_err("the second line is not");
        assert!(matches!(error, ReadError::Parse { line_nr: 2, .. }));
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let mut reader = PlanReader::new("migrate(vm1,n1,0,1)\n".as_bytes());
        assert!(reader.next_action().is_err());
    }

    #[test]
    fn layout_lines_round_trip_with_escaping() {
        let lines = vec![
            NodeLine {
                node: "n1".to_owned(),
                vms: vec!["vm1".to_owned(), "vm 2".to_owned()],
            },
            NodeLine {
                node: "rack:1".to_owned(),
                vms: vec![],
            },
        ];

        let mut sink: Vec<u8> = Vec::new();
        let mut writer = LayoutWriter::new(&mut sink);
        for line in &lines {
            writer.write_node(line).expect("writing to memory");
        }
        writer.finish().expect("flushing to memory");

        let mut reader = LayoutReader::new(sink.as_slice());
        let mut parsed = Vec::new();
        while let Some(line) = reader.next_node().expect("the layout is well-formed") {
            parsed.push(line);
        }
        assert_eq!(parsed, lines);
    }

    #[test]
    fn a_glued_colon_separator_is_accepted() {
        let mut reader = LayoutReader::new("n1: vm1 vm2\n".as_bytes());
        let line = reader
            .next_node()
            .expect("the layout is well-formed")
            .expect("one line is present");
        assert_eq!(line.node, "n1");
        assert_eq!(line.vms, vec!["vm1".to_owned(), "vm2".to_owned()]);
    }
}
