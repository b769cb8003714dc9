use jack::{compile_str, Error, ErrorClass, Options};

static LIST: &str = r#"
// Linked list of integers.
/** Keeps a running count of created nodes. */
class List {
    field int data;
    field List next;
    static int nodeCount;

    constructor List new(int car, List cdr) {
        let data = car;
        let next = cdr;
        let nodeCount = nodeCount + 1;
        return this;
    }

    method int getData() {
        return data;
    }

    method void print() {
        var List current;
        let current = this;
        while (~(current = null)) {
            do Output.printInt(current.getData());
            do Output.printChar(32); /* space */
            let current = current.getNext();
        }
        return;
    }

    method void dispose() {
        if (~(next = null)) {
            do next.dispose();
        }
        do Memory.deAlloc(this);
        return;
    }

    function int getNodeCount() {
        return nodeCount;
    }
}
"#;

fn flat() -> Options {
    Options { indent: 0 }
}

fn compile_lines(source: &str) -> Vec<String> {
    compile_str(source, &flat())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Lines of the named function, from its `function` line up to the next one.
fn function_body<'a>(lines: &'a [String], name: &str) -> &'a [String] {
    let header = format!("function {} ", name);
    let start = lines
        .iter()
        .position(|l| l.starts_with(&header))
        .unwrap_or_else(|| panic!("no function {}", name));
    let end = lines[start + 1..]
        .iter()
        .position(|l| l.starts_with("function "))
        .map(|n| start + 1 + n)
        .unwrap_or(lines.len());
    &lines[start..end]
}

fn label_numbers(lines: &[String]) -> Vec<usize> {
    lines
        .iter()
        .filter_map(|l| l.strip_prefix("label "))
        .map(|label| label.rsplit('_').next().unwrap().parse().unwrap())
        .collect()
}

#[test]
fn test_one_function_per_subroutine() {
    let lines = compile_lines(LIST);
    let functions: Vec<_> = lines.iter().filter(|l| l.starts_with("function ")).collect();
    assert_eq!(
        functions,
        vec![
            "function List.new 0",
            "function List.getData 0",
            "function List.print 1",
            "function List.dispose 0",
            "function List.getNodeCount 0",
        ]
    );
}

#[test]
fn test_constructor() {
    let lines = compile_lines(LIST);
    assert_eq!(
        function_body(&lines, "List.new"),
        &[
            "function List.new 0",
            "push constant 2",
            "call Memory.alloc 1",
            "pop pointer 0",
            "push argument 0",
            "pop this 0",
            "push argument 1",
            "pop this 1",
            "push static 0",
            "push constant 1",
            "add",
            "pop static 0",
            "push pointer 0",
            "return",
        ]
    );
}

#[test]
fn test_method_with_loop() {
    let lines = compile_lines(LIST);
    assert_eq!(
        function_body(&lines, "List.print"),
        &[
            "function List.print 1",
            "push argument 0",
            "pop pointer 0",
            "push pointer 0",
            "pop local 0",
            "label List_0",
            "push local 0",
            "push constant 0",
            "eq",
            "not",
            "not",
            "if-goto List_1",
            "push local 0",
            "call List.getData 1",
            "call Output.printInt 1",
            "pop temp 0",
            "push constant 32",
            "call Output.printChar 1",
            "pop temp 0",
            "push local 0",
            "call List.getNext 1",
            "pop local 0",
            "goto List_0",
            "label List_1",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn test_dispose() {
    let lines = compile_lines(LIST);
    assert_eq!(
        function_body(&lines, "List.dispose"),
        &[
            "function List.dispose 0",
            "push argument 0",
            "pop pointer 0",
            "push this 1",
            "push constant 0",
            "eq",
            "not",
            "not",
            "if-goto List_3",
            "push this 1",
            "call List.dispose 1",
            "pop temp 0",
            "goto List_2",
            "label List_3",
            "label List_2",
            "push pointer 0",
            "call Memory.deAlloc 1",
            "pop temp 0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn test_constructor_allocates_before_statements() {
    let lines = compile_lines(
        "class P {
            field int x, y;
            static int made;
            field boolean seen;
            constructor P new() { do P.hello(); return this; }
        }",
    );
    assert_eq!(
        &lines[..6],
        &[
            "function P.new 0",
            "push constant 3",
            "call Memory.alloc 1",
            "pop pointer 0",
            "call P.hello 0",
            "pop temp 0",
        ]
    );
}

#[test]
fn test_method_binds_receiver_before_statements() {
    let lines = compile_lines("class P { method void m(int a) { let a = 1; return; } }");
    assert_eq!(
        &lines[..5],
        &[
            "function P.m 0",
            "push argument 0",
            "pop pointer 0",
            "push constant 1",
            "pop argument 1",
        ]
    );
}

#[test]
fn test_if_else() {
    let lines = compile_lines(
        "class Foo {
            field int x;
            method void f() {
                if (x < 5) { let x = x + 1; } else { let x = 0; }
                return;
            }
        }",
    );
    assert_eq!(
        &lines[3..],
        &[
            "push this 0",
            "push constant 5",
            "lt",
            "not",
            "if-goto Foo_1",
            "push this 0",
            "push constant 1",
            "add",
            "pop this 0",
            "goto Foo_0",
            "label Foo_1",
            "push constant 0",
            "pop this 0",
            "label Foo_0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn test_labels_are_unique_and_paired() {
    let lines = compile_lines(
        "class N {
            function void f(int n) {
                while (n > 0) {
                    if (n = 3) { let n = n - 1; }
                    while (false) { }
                    let n = n - 1;
                }
                if (true) { } else { if (false) { } }
                return;
            }
        }",
    );
    let mut labels = label_numbers(&lines);
    assert_eq!(labels.len(), 10);
    labels.sort();
    assert_eq!(labels, (0..10).collect::<Vec<_>>());

    // each construct branches to its second label and jumps to its first
    let if_gotos = lines.iter().filter(|l| l.starts_with("if-goto")).count();
    let gotos = lines.iter().filter(|l| l.starts_with("goto")).count();
    assert_eq!(if_gotos, 5);
    assert_eq!(gotos, 5);
}

#[test]
fn test_labels_restart_per_unit() {
    let source = "class R { function void f() { while (true) { } return; } }";
    let first = compile_lines(source);
    let second = compile_lines(source);
    assert_eq!(first, second);
    assert_eq!(label_numbers(&first), vec![0, 1]);
}

#[test]
fn test_integer_range() {
    let lines = compile_lines(
        "class I { function int f() { return 0 + 32767 - (-32767); } }",
    );
    assert_eq!(
        &lines[1..8],
        &[
            "push constant 0",
            "push constant 32767",
            "add",
            "push constant 32767",
            "neg",
            "sub",
            "return",
        ]
    );

    let err = compile_str(
        "class I { function int f() { return 32768; } }",
        &flat(),
    )
    .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Semantic);
    assert!(matches!(err, Error::IntOutOfRange { value: 32768, .. }));
    assert_eq!(err.to_string(), "1:37: integer constant 32768 out of range");

    let err = compile_str("class I { function int f() { return -32768; } }", &flat())
        .unwrap_err();
    assert!(matches!(err, Error::IntOutOfRange { value: 32768, .. }));
}

#[test]
fn test_string_literal() {
    let lines = compile_lines(
        r#"class S { function void f() { do Output.printString("Hi !"); return; } }"#,
    );
    assert_eq!(
        &lines[1..14],
        &[
            "push constant 4",
            "call String.new 1",
            "push constant 72",
            "call String.appendChar 2",
            "push constant 105",
            "call String.appendChar 2",
            "push constant 32",
            "call String.appendChar 2",
            "push constant 33",
            "call String.appendChar 2",
            "call Output.printString 1",
            "pop temp 0",
            "push constant 0",
        ]
    );
}

#[test]
fn test_empty_string_literal() {
    let lines = compile_lines(r#"class S { function String f() { return ""; } }"#);
    assert_eq!(
        &lines[1..],
        &["push constant 0", "call String.new 1", "return"]
    );
}

#[test]
fn test_bare_call_in_method() {
    let lines = compile_lines("class Bar { method void m() { do foo(1); return; } }");
    assert_eq!(
        &lines[3..7],
        &[
            "push pointer 0",
            "push constant 1",
            "call Bar.foo 2",
            "pop temp 0",
        ]
    );
}

#[test]
fn test_dealloc_this() {
    let lines = compile_lines(
        "class Bar { method void dispose() { do Memory.deAlloc(this); return; } }",
    );
    assert_eq!(
        &lines[3..6],
        &["push pointer 0", "call Memory.deAlloc 1", "pop temp 0"]
    );
}

#[test]
fn test_call_on_local_object() {
    let lines = compile_lines(
        "class Main {
            function void main() {
                var Point p;
                let p = Point.new(3, 4);
                do p.move(p.getX(), 1);
                return;
            }
        }",
    );
    assert_eq!(
        &lines[..12],
        &[
            "function Main.main 1",
            "push constant 3",
            "push constant 4",
            "call Point.new 2",
            "pop local 0",
            "push local 0",
            "push local 0",
            "call Point.getX 1",
            "push constant 1",
            "call Point.move 3",
            "pop temp 0",
            "push constant 0",
        ]
    );
}

#[test]
fn test_indented_output_keeps_labels_flush() {
    let out = compile_str(
        "class Counter {
            field int n;
            method void spin() {
                while (n > 0) { let n = n - 1; }
                return;
            }
        }",
        &Options::default(),
    )
    .unwrap();
    assert_eq!(
        out,
        "function Counter.spin 0\n\
         \x20   push argument 0\n\
         \x20   pop pointer 0\n\
         label Counter_0\n\
         \x20   push this 0\n\
         \x20   push constant 0\n\
         \x20   gt\n\
         \x20   not\n\
         \x20   if-goto Counter_1\n\
         \x20   push this 0\n\
         \x20   push constant 1\n\
         \x20   sub\n\
         \x20   pop this 0\n\
         \x20   goto Counter_0\n\
         label Counter_1\n\
         \x20   push constant 0\n\
         \x20   return\n"
    );
}

#[test]
fn test_error_classes() {
    let cases = [
        ("class A { function void f() { return \"oops; } }", ErrorClass::Lexical),
        ("class A { /* open", ErrorClass::Lexical),
        ("class A { function void f() { return $; } }", ErrorClass::Lexical),
        ("class A { function void f() { return; }", ErrorClass::Syntactic),
        ("class A { function void f() { if x { } return; } }", ErrorClass::Syntactic),
        ("class A { field int int; }", ErrorClass::Syntactic),
        ("class A { static int a, a; }", ErrorClass::Semantic),
        ("class A { function void f() { let b = 1; return; } }", ErrorClass::Semantic),
    ];
    for (source, class) in cases {
        let err = compile_str(source, &flat()).unwrap_err();
        assert_eq!(err.class(), class, "{}: {}", source, err);
        assert!(err.pos().is_some());
    }
}

#[test]
fn test_syntax_error_names_expected_and_found() {
    let err = compile_str("class A {\n  method 5() { return; }\n}", &flat()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "2:10: expected 'void' or type, got integer '5'"
    );
}
