use miette::{Diagnostic, IntoDiagnostic, NamedSource, Result, SourceSpan};
use rustyline::{error::ReadlineError, DefaultEditor};
use thiserror::Error;
use yamlet::{CollectionState, ReadError, Reader};
use yamlet_parser::{parse_str, ParseError};

/// A REPL to read a YAML document one typed value at a time.
///
/// See [`read_action`] for commands.
fn main() -> Result<()> {
    let args: Vec<_> = std::env::args().collect();
    let [_, filename] = args.as_slice() else {
        eprintln!("Usage: walk <file.yaml>");
        return Ok(());
    };
    let contents = std::fs::read_to_string(filename).into_diagnostic()?;
    let root = match parse_str(&contents) {
        Ok(root) => root,
        Err(error) => return Err(InvalidYaml::new(filename, contents, &error).into()),
    };
    walk(&mut Reader::new(&root))
}

fn walk(reader: &mut Reader<'_>) -> Result<()> {
    let mut io = DefaultEditor::new().into_diagnostic()?;
    let mut collections: Vec<CollectionState> = vec![];

    loop {
        let outcome = match read_action(&mut io)? {
            Action::Stop => break,
            Action::Expect(kind) => expect(reader, kind, &mut collections),
            Action::Next => match collections.last().copied() {
                Some(state) if reader.has_unprocessed_items(&state) => {
                    Ok(format!("{} item(s)", state.size()))
                }
                Some(_) => {
                    collections.pop();
                    Ok("end of collection".to_owned())
                }
                None => Ok("not in a collection".to_owned()),
            },
            Action::Checkpoint => {
                reader.set_checkpoint();
                Ok("checkpoint set".to_owned())
            }
            Action::Rollback => {
                reader.rollback();
                Ok("rolled back".to_owned())
            }
            Action::Commit => {
                reader.commit();
                Ok("committed".to_owned())
            }
        };
        match outcome {
            Ok(message) => println!("{message}"),
            Err(error) => eprintln!("error: {error}"),
        }
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Kind {
    Integer,
    Unsigned,
    Boolean,
    Float,
    String,
    Timestamp,
    Null,
    Sequence,
    Mapping,
    Stream,
    Any,
    Skip,
}

fn expect(
    reader: &mut Reader<'_>,
    kind: Kind,
    collections: &mut Vec<CollectionState>,
) -> Result<String, ReadError> {
    let mut enter = |state: CollectionState| {
        collections.push(state);
        format!("entered, {} item(s)", state.size())
    };
    Ok(match kind {
        Kind::Integer => reader.expect_integer()?.to_string(),
        Kind::Unsigned => reader.expect_unsigned()?.to_string(),
        Kind::Boolean => reader.expect_boolean()?.to_string(),
        Kind::Float => reader.expect_float()?.to_string(),
        Kind::String => format!("{:?}", reader.expect_string()?),
        Kind::Timestamp => reader.expect_timestamp()?.to_string(),
        Kind::Null => reader.skip_null()?.to_string(),
        Kind::Sequence => enter(reader.expect_sequence()?),
        Kind::Mapping => enter(reader.expect_mapping()?),
        Kind::Stream => enter(reader.expect_stream()?),
        Kind::Any => format!("{:?}", reader.any()?),
        Kind::Skip => {
            reader.skip()?;
            "skipped".to_owned()
        }
    })
}

enum Action {
    Expect(Kind),
    Next,
    Checkpoint,
    Rollback,
    Commit,
    Stop,
}

fn read_action(io: &mut DefaultEditor) -> Result<Action> {
    loop {
        match io.readline(">> ") {
            Ok(line) => {
                let action = match line.trim() {
                    "q" | "quit" => Action::Stop,
                    "i" | "int" => Action::Expect(Kind::Integer),
                    "u" | "uint" => Action::Expect(Kind::Unsigned),
                    "b" | "bool" => Action::Expect(Kind::Boolean),
                    "f" | "float" => Action::Expect(Kind::Float),
                    "s" | "str" => Action::Expect(Kind::String),
                    "t" | "ts" => Action::Expect(Kind::Timestamp),
                    "null" => Action::Expect(Kind::Null),
                    "seq" => Action::Expect(Kind::Sequence),
                    "map" => Action::Expect(Kind::Mapping),
                    "docs" => Action::Expect(Kind::Stream),
                    "a" | "any" => Action::Expect(Kind::Any),
                    "skip" => Action::Expect(Kind::Skip),
                    "n" | "next" => Action::Next,
                    "cp" => Action::Checkpoint,
                    "rb" => Action::Rollback,
                    "commit" => Action::Commit,
                    _ => {
                        eprintln!(
                            "commands: int uint bool float str ts null seq map docs any skip \
                             next cp rb commit quit"
                        );
                        continue;
                    }
                };
                io.add_history_entry(line.as_str()).into_diagnostic()?;
                return Ok(action);
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(Action::Stop),
            Err(e) => return Err(e).into_diagnostic(),
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
#[error("invalid YAML")]
#[diagnostic()]
pub struct InvalidYaml {
    #[source_code]
    src: NamedSource<String>,
    #[label("{info}")]
    span: SourceSpan,
    info: String,
}

impl InvalidYaml {
    fn new(filename: &str, contents: String, error: &ParseError) -> Self {
        let position = error.position();
        let offset = byte_offset(&contents, position.row, position.column);
        InvalidYaml {
            src: NamedSource::new(filename, contents),
            span: (offset, 1).into(),
            info: error.info(),
        }
    }
}

/// Return the byte offset of the rune at `column` (1-indexed, in runes) of line `row`.
fn byte_offset(contents: &str, row: usize, column: usize) -> usize {
    let mut offset = 0;
    for (i, line) in contents.split_inclusive('\n').enumerate() {
        if i + 1 == row {
            return offset
                + line
                    .char_indices()
                    .nth(column.saturating_sub(1))
                    .map_or(line.len(), |(index, _)| index);
        }
        offset += line.len();
    }
    contents.len()
}
