//! Compile a FratmScript program to JavaScript with a source map.

use fratm::{CompileOptions, StmtKind};

fn main() {
    let input = "\
chist è nomi = [\"Ciro\", \"Gennaro\"]

facc saluta(nome) {
  piglie \"Uè, \" + nome + \"!\"
}

pe (tien i = 0; i < nomi.length; i++) {
  stamm a dì(saluta(nomi[i]))
}
";

    let tokens = fratm::tokenize(input).expect("tokenize failed");
    let program = fratm::parse(&tokens).expect("parse failed");
    println!("Statements: {}", program.body.len());
    for stmt in &program.body {
        let what = match &stmt.kind {
            StmtKind::VarDecl(decl) => format!("declaration of {}", decl.name.name),
            StmtKind::FunctionDecl(function) => format!("function {}", function.name.name),
            StmtKind::For { .. } => "for loop".to_string(),
            other => format!("{other:?}"),
        };
        println!("  line {}: {what}", stmt.span.line);
    }

    let options = CompileOptions::new().source_map(true).filename("saluti.fratm");
    let output = fratm::compile(input, &options).expect("compile failed");
    println!("\nJavaScript:\n{}", output.code);

    if let Some(map) = output.source_map {
        println!("Source map for {}:", map.file.as_deref().unwrap_or("?"));
        println!("{}", map.to_json().expect("serialize failed"));
    }
}
