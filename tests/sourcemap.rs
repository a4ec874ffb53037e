use fratm::sourcemap::OriginalPosition;
use fratm::{CompileOptions, SourceMap, compile};

fn compile_with_map(input: &str) -> (String, SourceMap) {
    let options = CompileOptions::new().source_map(true).filename("prova.fratm");
    let output = compile(input, &options).expect("compile failed");
    let map = output.source_map.expect("source map requested");
    // go through JSON so the serialized form is what gets checked
    let json = map.to_json().expect("serialize");
    (output.code, SourceMap::from_json(&json).expect("deserialize"))
}

fn lookup(map: &SourceMap, line: u32, column: u32) -> OriginalPosition {
    map.original_position_for(line, column)
        .expect("decode")
        .unwrap_or_else(|| panic!("no mapping at {line}:{column}"))
}

#[test]
fn declaration_round_trip() {
    let (code, map) = compile_with_map("tien a = 1\nchist è nome = \"Ciro\"");
    assert_eq!(code, "let a = 1;\nconst nome = \"Ciro\";\n");

    let stmt = lookup(&map, 1, 0);
    assert_eq!((stmt.line, stmt.column), (1, 0));
    assert_eq!(stmt.source, "prova.fratm");

    let name = lookup(&map, 1, 6);
    assert_eq!((name.line, name.column), (1, 8));
    assert_eq!(name.name.as_deref(), Some("nome"));

    let value = lookup(&map, 1, 13);
    assert_eq!((value.line, value.column), (1, 15));
}

#[test]
fn function_round_trip() {
    let (code, map) = compile_with_map("facc saluta(nome) {\n  piglie nome\n}");
    assert_eq!(code, "function saluta(nome) {\n  return nome;\n}\n");

    let function_name = lookup(&map, 0, 9);
    assert_eq!((function_name.line, function_name.column), (0, 5));
    assert_eq!(function_name.name.as_deref(), Some("saluta"));

    let param = lookup(&map, 0, 16);
    assert_eq!((param.line, param.column), (0, 12));

    let ret = lookup(&map, 1, 2);
    assert_eq!((ret.line, ret.column), (1, 2));

    let returned = lookup(&map, 1, 9);
    assert_eq!((returned.line, returned.column), (1, 9));
    assert_eq!(returned.name.as_deref(), Some("nome"));
}

#[test]
fn class_method_round_trip() {
    let (code, map) = compile_with_map("na famiglie A {\n  facc saluta() {\n    piglie 1\n  }\n}");
    assert_eq!(
        code,
        "class A {\n  saluta() {\n    return 1;\n  }\n}\n"
    );

    let class_name = lookup(&map, 0, 6);
    assert_eq!((class_name.line, class_name.column), (0, 12));
    assert_eq!(class_name.name.as_deref(), Some("A"));

    let method = lookup(&map, 1, 2);
    assert_eq!(method.line, 1);
    assert_eq!(method.name.as_deref(), Some("saluta"));

    let body = lookup(&map, 2, 4);
    assert_eq!((body.line, body.column), (2, 4));
}

#[test]
fn columns_count_characters_not_bytes() {
    let (_, map) = compile_with_map("chist è è_bell = overo");
    // `const è_bell = true;`: `true` starts at column 15
    let value = lookup(&map, 0, 15);
    assert_eq!((value.line, value.column), (0, 17));
}

#[test]
fn map_metadata() {
    let options = CompileOptions::new()
        .source_map(true)
        .filename("prova.fratm")
        .include_source_content(true);
    let map = compile("tien x", &options)
        .expect("compile failed")
        .source_map
        .expect("source map requested");
    assert_eq!(map.version, 3);
    assert_eq!(map.file.as_deref(), Some("prova.js"));
    assert_eq!(map.sources, vec!["prova.fratm".to_string()]);
    assert_eq!(map.sources_content, Some(vec![Some("tien x".to_string())]));

    let json: serde_json::Value =
        serde_json::from_str(&map.to_json().expect("serialize")).expect("valid json");
    assert_eq!(json["sourcesContent"][0], "tien x");
    assert!(json["mappings"].as_str().is_some_and(|m| !m.is_empty()));
}

#[test]
fn no_map_unless_requested() {
    let output = compile("tien x", &CompileOptions::default()).expect("compile failed");
    assert!(output.source_map.is_none());
}

#[test]
fn operators_map_to_their_words() {
    let (code, map) = compile_with_map("tien ok = a e b\nok = ok o a + 1");
    assert_eq!(code, "let ok = a && b;\nok = ok || a + 1;\n");

    let and = lookup(&map, 0, 11);
    assert_eq!((and.line, and.column), (0, 12));
    assert_eq!(and.name, None);

    let assign = lookup(&map, 1, 3);
    assert_eq!((assign.line, assign.column), (1, 3));
    let or = lookup(&map, 1, 8);
    assert_eq!((or.line, or.column), (1, 8));
    let plus = lookup(&map, 1, 13);
    assert_eq!((plus.line, plus.column), (1, 12));
}

#[test]
fn else_and_catch_map_to_their_keywords() {
    let (code, map) = compile_with_map("si (x) {\n  f()\n}\nsinnò si (y) {\n  g()\n}");
    assert_eq!(code, "if (x) {\n  f();\n} else if (y) {\n  g();\n}\n");
    let else_keyword = lookup(&map, 2, 2);
    assert_eq!((else_keyword.line, else_keyword.column), (3, 0));
    let if_keyword = lookup(&map, 2, 7);
    assert_eq!((if_keyword.line, if_keyword.column), (3, 6));

    let (code, map) =
        compile_with_map("pruvamm {\n  f()\n}\ne si schiatta (err) {\n  g(err)\n}");
    assert_eq!(code, "try {\n  f();\n} catch (err) {\n  g(err);\n}\n");
    let catch = lookup(&map, 2, 2);
    assert_eq!((catch.line, catch.column), (3, 0));
}
