use std::{fs, path::Path};

use libtest_mimic::{Arguments, Failed, Trial};

use yamlet_parser::{parse_str, Node, Quoting};

type Result<T, E = Box<dyn std::error::Error>> = std::result::Result<T, E>;

/// A named case of a corpus file.
///
/// ```text
/// === name
/// --- in
/// <yaml, each line followed by a line break>
/// --- out | --- error
/// <rendered tree, one document per line | error info>
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
        let mut expected_error = false;
        let mut section = "";
        for line in lines {
            match line {
                "--- in" | "--- out" | "--- error" => {
                    section = line;
                    expected_error |= line == "--- error";
                }
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
                expected_error,
            },
        ));
    }
    cases
}

fn run_case(case: &CorpusCase) -> Result<(), Failed> {
    match (parse_str(&case.yaml), case.expected_error) {
        (Ok(node), false) => {
            let actual = render(&node);
            if actual == case.expected {
                Ok(())
            } else {
                Err(format!(
                    "trees differ\n### Input:\n{}### Expected:\n{}\n### Actual:\n{actual}",
                    case.yaml, case.expected
                )
                .into())
            }
        }
        (Err(error), true) => {
            if error.info() == case.expected {
                Ok(())
            } else {
                Err(format!("expected error `{}`, got `{error}`", case.expected).into())
            }
        }
        (Ok(node), true) => Err(format!("no error when expected:\n{node}").into()),
        (Err(error), false) => Err(format!("unexpected error {error}").into()),
    }
}

/// Render a tree on a single line per document, flow style.
fn render(node: &Node) -> String {
    match node {
        Node::Stream { documents } => join(documents, "\n"),
        Node::Content {
            properties,
            content: inner,
        }
        | Node::Collection {
            properties,
            collection: inner,
        } => format!(
            "{}{}",
            properties.as_deref().map(render).unwrap_or_default(),
            render(inner)
        ),
        Node::Properties { tag, anchor } => format!(
            "{}{}",
            anchor.as_deref().map(render).unwrap_or_default(),
            tag.as_deref().map(render).unwrap_or_default()
        ),
        Node::Anchor { text } => format!("&{text} "),
        Node::Tag { text } => format!("<{text}> "),
        Node::Alias { text } => format!("*{text}"),
        Node::Sequence { entries } => format!("[{}]", join(entries, ", ")),
        Node::Mapping { entries } => format!("{{{}}}", join(entries, ", ")),
        Node::MappingEntry { key, value } => format!("{}: {}", render(key), render(value)),
        Node::Text {
            text,
            quoting: Quoting::None,
        } => format!("{text:?}"),
        Node::Text { text, quoting } => format!("{quoting:?}{text:?}"),
        Node::Null => "~".to_owned(),
    }
}

fn join(nodes: &[Node], separator: &str) -> String {
    nodes.iter().map(render).collect::<Vec<_>>().join(separator)
}
