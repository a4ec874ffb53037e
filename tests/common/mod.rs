#![allow(dead_code)]

use std::io::Write;
use std::process::{Command, Stdio};

use fratm::{CompileOptions, Error, Token, compile, tokenize};

/// Compile with default options, panicking with the error on failure.
pub fn compile_ok(input: &str) -> String {
    compile(input, &CompileOptions::default())
        .unwrap_or_else(|e| panic!("compile failed: {e}\n--- input ---\n{input}"))
        .code
}

/// Compile and return the error, panicking if compilation succeeds.
pub fn compile_err(input: &str) -> Error {
    match compile(input, &CompileOptions::default()) {
        Ok(output) => panic!(
            "expected an error\n--- input ---\n{input}\n--- got ---\n{}",
            output.code
        ),
        Err(e) => e,
    }
}

pub fn tokens(input: &str) -> Vec<Token> {
    tokenize(input).expect("tokenize failed")
}

/// Kinds of the non-trivia tokens, by their stable names.
pub fn kind_names(input: &str) -> Vec<&'static str> {
    tokens(input)
        .iter()
        .filter(|t| !t.kind.is_trivia())
        .map(|t| t.kind.name())
        .collect()
}

/// Run JavaScript under `node`, returning stdout. `None` when node is not
/// installed.
pub fn run_node(code: &str) -> Option<String> {
    let mut child = Command::new("node")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .ok()?;
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(code.as_bytes())
        .expect("write to node");
    let output = child.wait_with_output().expect("wait for node");
    assert!(
        output.status.success(),
        "node failed:\n{}\n--- code ---\n{code}",
        String::from_utf8_lossy(&output.stderr)
    );
    Some(String::from_utf8(output.stdout).expect("utf-8 output"))
}
