use lirflow_core::{
    format::{format_function, format_program},
    ArithOp, CallKind, CmpOp, Instruction, Operand, Operation, ProgramPoint, Terminator, Type,
};
use lirflow_parser::{load, load_file, parse_line, Line, ParseError};
use pretty_assertions::assert_eq;
use std::io::Write;

const SAMPLE: &str = r#"
// linked list walk
struct Node {
  val: int
  next: &Node
}
struct Pair { a: int; b: &Pair }
g: int
gp: &int
extern ext_fn: (&int, int) -> int

fn helper(q: &int) -> int {
entry:
  v = $load q
  $ret v
}

fn test(p: &int, n: int) -> int {
let x: int, y: &int, fp: &(int) -> _
entry:
  x = $copy 5
  y = $addrof x
  $store y 7
  t = $load y
  c = $cmp lt x n
  $branch c bb1 bb2
bb1:
  r = $call_dir helper(y) then bb2
bb2:
  $ret x
}
"#;

fn op_at(function: &lirflow_core::Function, block: &str, index: usize) -> Operation {
    match function
        .get_block(block)
        .and_then(|b| b.get(&ProgramPoint::at(block, index)))
    {
        Some(Instruction::NonTerminal { op, .. }) => op.clone(),
        other => panic!("no operation at {block}.{index}: {other:?}"),
    }
}

#[test]
fn test_load_declarations() {
    let program = load(SAMPLE);

    let node = program.get_struct("Node").unwrap();
    assert_eq!(
        node.fields.get("next"),
        Some(&Type::pointer(Type::Struct("Node".to_string())))
    );
    let pair = program.get_struct("Pair").unwrap();
    assert_eq!(pair.fields.len(), 2);

    assert_eq!(program.globals.get("g"), Some(&Type::Int));
    assert_eq!(program.globals.get("gp"), Some(&Type::pointer(Type::Int)));

    let ext = program.externs.get("ext_fn").unwrap();
    assert_eq!(ext.params, vec![Type::pointer(Type::Int), Type::Int]);
    assert_eq!(ext.ret, Some(Type::Int));

    assert_eq!(
        program.functions.keys().collect::<Vec<_>>(),
        vec!["helper", "test"]
    );
}

#[test]
fn test_load_function_body() {
    let program = load(SAMPLE);
    let test = program.get_function("test").unwrap();

    assert_eq!(test.params.len(), 2);
    assert_eq!(test.ret, Some(Type::Int));
    assert_eq!(
        test.locals.get("fp"),
        Some(&Type::pointer(Type::function(vec![Type::Int], None)))
    );
    assert_eq!(
        test.blocks.keys().collect::<Vec<_>>(),
        vec!["entry", "bb1", "bb2"]
    );

    assert_eq!(
        op_at(test, "entry", 2),
        Operation::Store {
            dst: "y".to_string(),
            value: Operand::Const(7),
        }
    );
    assert_eq!(
        op_at(test, "entry", 4),
        Operation::Cmp {
            dst: "c".to_string(),
            op: CmpOp::Lt,
            lhs: Operand::var("x"),
            rhs: Operand::var("n"),
        }
    );

    let bb1 = test.get_block("bb1").unwrap();
    assert_eq!(bb1.successors(), vec!["bb2".to_string()]);
    assert!(bb1.terminator().is_none());
    match op_at(test, "bb1", 0) {
        Operation::Call(call) => {
            assert_eq!(call.kind, CallKind::Direct);
            assert_eq!(call.dst.as_deref(), Some("r"));
            assert_eq!(call.args, vec![Operand::var("y")]);
        }
        other => panic!("expected a call, got {other:?}"),
    }
}

#[test]
fn test_every_instruction_form() {
    let cases: Vec<(&str, Line)> = vec![
        (
            "x = $arith div a -3",
            Line::Operation(Operation::Arith {
                dst: "x".into(),
                op: ArithOp::Div,
                lhs: Operand::var("a"),
                rhs: Operand::Const(-3),
            }),
        ),
        (
            "e = $gep arr i",
            Line::Operation(Operation::Gep {
                dst: "e".into(),
                base: "arr".into(),
                index: Operand::var("i"),
            }),
        ),
        (
            "f = $gfp node next",
            Line::Operation(Operation::Gfp {
                dst: "f".into(),
                base: "node".into(),
                field: "next".into(),
            }),
        ),
        (
            "h = $alloc 1 _a1",
            Line::Operation(Operation::Alloc {
                dst: "h".into(),
                size: Operand::Const(1),
                id: Some("_a1".into()),
            }),
        ),
        (
            "h = $alloc n [_a2]",
            Line::Operation(Operation::Alloc {
                dst: "h".into(),
                size: Operand::var("n"),
                id: Some("_a2".into()),
            }),
        ),
        (
            "h = $alloc 4",
            Line::Operation(Operation::Alloc {
                dst: "h".into(),
                size: Operand::Const(4),
                id: None,
            }),
        ),
        (
            "$call_ext log(1, x)",
            Line::Operation(Operation::Call(lirflow_core::Call {
                dst: None,
                kind: CallKind::External,
                callee: "log".into(),
                args: vec![Operand::Const(1), Operand::var("x")],
                next: None,
            })),
        ),
        (
            "r = $call_idr fp() then bb4",
            Line::Operation(Operation::Call(lirflow_core::Call {
                dst: Some("r".into()),
                kind: CallKind::Indirect,
                callee: "fp".into(),
                args: Vec::new(),
                next: Some("bb4".into()),
            })),
        ),
        ("$jump bb9", Line::Terminator(Terminator::Jump("bb9".into()))),
        (
            "$branch 1 yes no",
            Line::Terminator(Terminator::Branch {
                cond: Operand::Const(1),
                then_block: "yes".into(),
                else_block: "no".into(),
            }),
        ),
        ("$ret", Line::Terminator(Terminator::Ret(None))),
        ("ret", Line::Terminator(Terminator::Ret(None))),
        (
            "ret x // done",
            Line::Terminator(Terminator::Ret(Some(Operand::var("x")))),
        ),
    ];

    for (text, expected) in cases {
        assert_eq!(parse_line(text).unwrap(), expected, "{text}");
    }
}

#[test]
fn test_malformed_lines_are_skipped() {
    let program = load(
        "fn test() {\nentry:\n  x = $copy 1\n  x = $bogus 2\n  $jump\n  $ret x\n}\n",
    );
    let test = program.get_function("test").unwrap();
    let entry = test.entry_block().unwrap();
    assert_eq!(entry.instructions.len(), 2);
    assert_eq!(
        entry.terminator(),
        Some(&Terminator::Ret(Some(Operand::var("x"))))
    );
}

#[test]
fn test_formatting_reloads_to_same_function() {
    let program = load(SAMPLE);
    let test = program.get_function("test").unwrap();
    let text = format_function(test);
    let reloaded = load(&text);
    assert_eq!(reloaded.get_function("test"), Some(test));
}

#[test]
fn test_load_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();
    let program = load_file(file.path()).unwrap();
    assert!(program.get_function("test").is_some());

    let missing = load_file("/definitely/not/here.lir");
    assert!(matches!(missing, Err(ParseError::Io { .. })));
}

#[test]
fn test_opcodes_are_whole_words() {
    for text in ["x = $copyy", "$jumpbb1", "x = $loadp", "$retx", "$store7 p 1"] {
        assert!(parse_line(text).is_err(), "{text}");
    }
    assert_eq!(
        parse_line("$ret 0").unwrap(),
        Line::Terminator(Terminator::Ret(Some(Operand::Const(0))))
    );
}

const ALLOCATING: &str = r#"
fn test(n: int) -> int {
let h: &int, v: int
entry:
  h = $alloc n [_a1]
  v = $load h
  $ret v
}
"#;

#[test]
fn test_bracketed_alloc_keeps_indices() {
    let program = load(ALLOCATING);
    let test = program.get_function("test").unwrap();
    assert_eq!(
        op_at(test, "entry", 0),
        Operation::Alloc {
            dst: "h".to_string(),
            size: Operand::var("n"),
            id: Some("_a1".to_string()),
        }
    );
    assert_eq!(
        op_at(test, "entry", 1),
        Operation::Load {
            dst: "v".to_string(),
            src: "h".to_string(),
        }
    );

    let text = format_function(test);
    assert!(text.contains("h = $alloc n [_a1]"), "{text}");
    assert_eq!(load(&text).get_function("test"), Some(test));
}

#[test]
fn test_format_program_reloads() {
    let program = load(SAMPLE);
    let text = format_program(&program);
    assert!(text.starts_with("struct Node {\n"), "{text}");
    assert_eq!(load(&text), program);
}
