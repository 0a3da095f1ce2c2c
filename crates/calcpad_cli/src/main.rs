//! CLI entry point.
//!
//! # Responsibility
//! - Evaluate calculation lines from a file argument or stdin through one
//!   document pass.
//! - Keep output deterministic for quick local sanity checks.

use calcpad_core::{Document, DocumentService};
use std::io::Read;
use std::process::ExitCode;

fn main() -> ExitCode {
    let source = match read_input() {
        Ok(source) => source,
        Err(err) => {
            eprintln!("calcpad: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut doc = Document::new("cli");
    let service = DocumentService::default();

    let mut line_ids = Vec::new();
    for (index, text) in source.lines().enumerate() {
        let id = if index == 0 {
            doc.lines()[0].id
        } else {
            doc.append_line()
        };
        doc.set_line_input(id, text).expect("line just created");
        line_ids.push(id);
    }

    service.calculate_all(&mut doc);

    for id in line_ids {
        let line = doc.line(id).expect("line exists");
        let rendered = line
            .result
            .as_ref()
            .map(|result| result.formatted())
            .unwrap_or_default();
        if rendered.is_empty() {
            println!("{}", line.input);
        } else {
            println!("{}  =>  {rendered}", line.input);
        }
    }
    println!("total  =>  {}", service.total(&doc));

    ExitCode::SUCCESS
}

fn read_input() -> Result<String, String> {
    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(path) => {
            std::fs::read_to_string(&path).map_err(|err| format!("cannot read `{path}`: {err}"))
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| format!("cannot read stdin: {err}"))?;
            Ok(buffer)
        }
    }
}
