mod common;

use common::compile_ok;

#[test]
fn empty_program() {
    assert_eq!(compile_ok(""), "");
    assert_eq!(compile_ok("// solo commenti\n"), "");
}

#[test]
fn one_statement_per_line_with_semicolons() {
    assert_eq!(
        compile_ok("tien a = 1; a += 2; a--"),
        "let a = 1;\na += 2;\na--;\n"
    );
}

#[test]
fn while_loop_with_nested_if() {
    let input = "\
tien i = 0
mentre che (i < 10) {
  si (i % 2 === 0) {
    stamm a dì(i)
  }
  i++
}";
    let expected = "\
let i = 0;
while (i < 10) {
  if (i % 2 === 0) {
    console.log(i);
  }
  i++;
}
";
    assert_eq!(compile_ok(input), expected);
}

#[test]
fn else_if_chain() {
    let input = "si (a) { x() } sinnò si (b) { y() } sinnò { z() }";
    let expected = "\
if (a) {
  x();
} else if (b) {
  y();
} else {
  z();
}
";
    assert_eq!(compile_ok(input), expected);
}

#[test]
fn console_methods() {
    assert_eq!(
        compile_ok("avvis a dì(\"occhio\")\nscrive a dì(\"guaio\", 1)"),
        "console.warn(\"occhio\");\nconsole.error(\"guaio\", 1);\n"
    );
}

#[test]
fn arrow_functions() {
    assert_eq!(
        compile_ok("chist è somma = (a, b) => a + b"),
        "const somma = (a, b) => a + b;\n"
    );
    assert_eq!(
        compile_ok("chist è f = () => {\n  piglie 1\n}"),
        "const f = () => {\n  return 1;\n};\n"
    );
}

#[test]
fn arrow_inside_call_keeps_indentation() {
    let input = "facc f() {\n  lista.forEach(x => {\n    stamm a dì(x)\n  })\n}";
    let expected = "\
function f() {
  lista.forEach(x => {
    console.log(x);
  });
}
";
    assert_eq!(compile_ok(input), expected);
}

#[test]
fn conditional_and_logical() {
    assert_eq!(
        compile_ok("x = a e b o manco c ? 1 : 2"),
        "x = a && b || !c ? 1 : 2;\n"
    );
    assert_eq!(compile_ok("x = (a o b) e c"), "x = (a || b) && c;\n");
}

#[test]
fn arrays_objects_and_members() {
    assert_eq!(
        compile_ok("chist è p = { nome: \"Ciro\", \"anni\": 30, lista: [1, 2] }\np.lista[0] = p[\"anni\"]"),
        "const p = { nome: \"Ciro\", \"anni\": 30, lista: [1, 2] };\np.lista[0] = p[\"anni\"];\n"
    );
    assert_eq!(compile_ok("x = {}\ny = []"), "x = {};\ny = [];\n");
}

#[test]
fn keyword_property_names_are_verbatim() {
    assert_eq!(compile_ok("a.si = a.tien"), "a.si = a.tien;\n");
}

#[test]
fn new_this_typeof_delete() {
    let input = "\
na famiglie Conto {
  facc costruttore() {
    stu cos.saldo = 0
  }
  facc chiudi() {
    leva stu cos.saldo
    piglie chè è stu cos.saldo
  }
}
chist è c = nu bell Conto()";
    let expected = "\
class Conto {
  constructor() {
    this.saldo = 0;
  }
  chiudi() {
    delete this.saldo;
    return typeof this.saldo;
  }
}
const c = new Conto();
";
    assert_eq!(compile_ok(input), expected);
}

#[test]
fn throw_and_debugger() {
    assert_eq!(
        compile_ok("iett nu bell Error(\"male\")\nfermete"),
        "throw new Error(\"male\");\ndebugger;\n"
    );
}

#[test]
fn catch_without_parameter() {
    assert_eq!(
        compile_ok("pruvamm {\n  f()\n}\ne si schiatta {\n  g()\n}"),
        "try {\n  f();\n} catch {\n  g();\n}\n"
    );
}

#[test]
fn async_generator_method_and_exports() {
    let input = "\
mann for na famiglie Fila {
  mo vir facc carica() {
    piglie aspett leggi()
  }
  facc elementi() {
    caccia 1
  }
}
chiamm Base da \"./base.js\"
mann for predefinit Fila";
    let expected = "\
export class Fila {
  async carica() {
    return await leggi();
  }
  *elementi() {
    yield 1;
  }
}
import Base from \"./base.js\";
export default Fila;
";
    assert_eq!(compile_ok(input), expected);
}

#[test]
fn exported_function() {
    assert_eq!(
        compile_ok("mann for facc uno() { piglie 1 }"),
        "export function uno() {\n  return 1;\n}\n"
    );
}

#[test]
fn reserved_identifiers_are_renamed() {
    assert_eq!(
        compile_ok("facc f(class, new) { piglie class + new }"),
        "function f(class_, new_) {\n  return class_ + new_;\n}\n"
    );
}

#[test]
fn block_statement() {
    assert_eq!(compile_ok("{\n  tien a = 1\n}"), "{\n  let a = 1;\n}\n");
}

#[test]
fn output_is_deterministic() {
    let input = "facc f(n) { piglie n * (n + 1) / 2 }\nstamm a dì(f(10))";
    assert_eq!(compile_ok(input), compile_ok(input));
}
