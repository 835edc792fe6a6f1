use std::env;
use std::fs;

use yamlet::{Reader, Value};
use yamlet_parser::parse_str;

fn print_indent(indent: usize) {
    for _ in 0..indent {
        print!("    ");
    }
}

fn dump_value(value: &Value, indent: usize) {
    match value {
        Value::Sequence(items) => {
            for item in items {
                dump_value(item, indent + 1);
            }
        }
        Value::Mapping(entries) => {
            for (key, value) in entries {
                print_indent(indent);
                println!("{key:?}:");
                dump_value(value, indent + 1);
            }
        }
        _ => {
            print_indent(indent);
            println!("{value:?}");
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<_> = env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("Usage: dump_yaml <file.yaml>");
        std::process::exit(1);
    };
    let source = fs::read_to_string(path)?;
    let root = parse_str(&source)?;

    let mut reader = Reader::new(&root);
    let documents = reader.expect_stream()?;
    while reader.has_unprocessed_items(&documents) {
        println!("---");
        dump_value(&reader.any()?, 0);
    }
    Ok(())
}
