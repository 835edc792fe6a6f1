use std::{fs, path::Path};

use libtest_mimic::{Arguments, Failed, Trial};

use yamlet::{ReadError, Reader, Value};
use yamlet_parser::parse_str;

type Result<T, E = Box<dyn std::error::Error>> = std::result::Result<T, E>;

/// A named case of a corpus file.
///
/// ```text
/// === name
/// --- in
/// <yaml>
/// --- out | --- error
/// <one rendered value per document | error message>
/// ```
struct CorpusCase {
    yaml: String,
    expected: String,
    expected_error: bool,
}

fn main() -> Result<()> {
    let arguments = Arguments::from_args();
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/corpus");
    let mut tests = vec![];
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_owned();
        for (name, case) in load_cases(&fs::read_to_string(&path)?) {
            tests.push(Trial::test(format!("{stem}::{name}"), move || {
                run_case(&case)
            }));
        }
    }
    tests.sort_by(|a, b| a.name().cmp(b.name()));
    libtest_mimic::run(&arguments, tests).exit();
}

fn load_cases(text: &str) -> Vec<(String, CorpusCase)> {
    let mut cases = vec![];
    for block in text.split("=== ").filter(|b| !b.trim().is_empty()) {
        let mut lines = block.lines();
        let name = lines.next().unwrap_or_default().trim().to_owned();
        let mut yaml = String::new();
        let mut expected = vec![];
        let mut section = "";
        for line in lines {
            match line {
                "--- in" | "--- out" | "--- error" => section = line,
                _ if section == "--- in" => {
                    yaml.push_str(line);
                    yaml.push('\n');
                }
                _ if !section.is_empty() => expected.push(line),
                _ => {}
            }
        }
        while expected.last().is_some_and(|l| l.is_empty()) {
            expected.pop();
        }
        cases.push((
            name,
            CorpusCase {
                yaml,
                expected: expected.join("\n"),
                expected_error: section == "--- error",
            },
        ));
    }
    cases
}

/// Read every document of `yaml` as a [`Value`].
fn read_documents(yaml: &str) -> Result<Vec<Value>, ReadError> {
    let root = parse_str(yaml)?;
    let mut reader = Reader::new(&root);
    let stream = reader.expect_stream()?;
    let mut documents = vec![];
    while reader.has_unprocessed_items(&stream) {
        documents.push(reader.any()?);
    }
    reader.finish()?;
    Ok(documents)
}

fn run_case(case: &CorpusCase) -> Result<(), Failed> {
    match (read_documents(&case.yaml), case.expected_error) {
        (Ok(documents), false) => {
            let actual = documents.iter().map(render).collect::<Vec<_>>().join("\n");
            if actual == case.expected {
                Ok(())
            } else {
                Err(format!(
                    "values differ\n### Input:\n{}### Expected:\n{}\n### Actual:\n{actual}",
                    case.yaml, case.expected
                )
                .into())
            }
        }
        (Err(error), true) => {
            let actual = match &error {
                ReadError::Parse(error) => error.info(),
                error => error.to_string(),
            };
            if actual == case.expected {
                Ok(())
            } else {
                Err(format!("expected error `{}`, got `{actual}`", case.expected).into())
            }
        }
        (Ok(documents), true) => Err(format!("no error when expected: {documents:?}").into()),
        (Err(error), false) => Err(format!("unexpected error {error}").into()),
    }
}

/// Render a value on a single line, flow style. Strings are quoted, floats end with `f` and
/// timestamps start with `@`.
fn render(value: &Value) -> String {
    match value {
        Value::Null => "~".to_owned(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::FloatingPoint(f) => format!("{}f", f.into_inner()),
        Value::String(s) => format!("{s:?}"),
        Value::Timestamp(t) => format!("@{t}"),
        Value::Sequence(items) => {
            format!("[{}]", items.iter().map(render).collect::<Vec<_>>().join(", "))
        }
        Value::Mapping(entries) => format!(
            "{{{}}}",
            entries
                .iter()
                .map(|(k, v)| format!("{}: {}", render(k), render(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}
