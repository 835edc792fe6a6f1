use std::env;
use std::fs::File;
use std::io::prelude::*;

use yamlet_parser::{TokenKind, Tokenizer};

fn main() {
    let args: Vec<_> = env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("Usage: dump_tokens <file.yaml>");
        std::process::exit(1);
    };
    let mut f = File::open(path).unwrap();
    let mut s = String::new();
    f.read_to_string(&mut s).unwrap();

    let mut tokenizer = Tokenizer::from(s.as_str());
    loop {
        let token = tokenizer.next_token();
        println!("{token}  \x1B[;34m{:?}\x1B[;m", tokenizer.contexts());
        if token.kind == TokenKind::Eof {
            break;
        }
    }
}
