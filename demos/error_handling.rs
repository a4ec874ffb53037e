//! Inspect compile errors, directly and as serialized diagnostics.

use fratm::diagnostics::compile_response;
use fratm::{CompileOptions, Error};

fn main() {
    // `chist` without `è`
    match fratm::compile("chist nome = \"Ciro\"\n", &CompileOptions::default()) {
        Ok(_) => println!("Compiled OK (unexpected)"),
        Err(Error::Lex(e)) => println!("Lex error: {e}"),
        Err(Error::Parse(e)) => {
            println!("Parse error: {e}");
            println!("  Kind: {:?}", e.kind);
            println!("  Location: line {}, column {}", e.span.line, e.span.column);
            if let Some(hint) = e.kind.suggestion() {
                println!("  Help: {hint}");
            }
        }
    }

    println!();

    // Unterminated string
    match fratm::compile("stamm a dì(\"aperta)\n", &CompileOptions::default()) {
        Ok(_) => println!("Compiled OK (unexpected)"),
        Err(e) => {
            println!("Error: {e}");
            println!("  Message: {}", e.message());
            println!("  Location: line {}, column {}", e.line(), e.column());
        }
    }

    println!();

    // The same failures as JSON, the shape editors and playgrounds consume
    let response = compile_response("facc f() {\n  piglie 1\n", false);
    println!(
        "{}",
        serde_json::to_string_pretty(&response).expect("serialize failed")
    );
}
