/*! Whole-function tests for the analysis engines.
 *
 * Unit tests next to each engine cover its pieces. These build small functions end to end and
 * check the properties every result must have: fixpoints are stable, weak updates never lose a
 * definition, reruns agree, and dominator sets are consistent with the CFG.
 */


use crate::{builder::FunctionBuilder, program::Program, types::Type};

/// Wraps a single built function into a program.
pub(crate) fn program_with(builder: FunctionBuilder) -> Program {
    let mut program = Program::new();
    program.add_function(builder.build().unwrap());
    program
}

/// `test(c: int, q: &int)` with a loop, pointer writes through a parameter
/// and a call inside the loop body.
pub(crate) fn looping_program() -> Program {
    let mut program = Program::new();
    program.add_global("g", Type::Int);
    program.add_extern(
        "sink",
        crate::types::FunctionType {
            params: vec![Type::pointer(Type::Int)],
            ret: Some(Type::Int),
        },
    );

    let mut builder = FunctionBuilder::new("test");
    builder
        .param("c", Type::Int)
        .param("q", Type::pointer(Type::Int))
        .local("i", Type::Int)
        .local("x", Type::Int)
        .local("p", Type::pointer(Type::Int));
    builder
        .entry_block()
        .copy("i", 0)
        .copy("x", 1)
        .addrof("p", "x")
        .jump("header");
    builder
        .block("header")
        .cmp("t", crate::instructions::CmpOp::Lt, "i", "c")
        .branch("t", "body", "exit");
    builder
        .block("body")
        .store("p", "i")
        .store("q", 3)
        .call_ext(Some("r"), "sink", vec!["p".into()])
        .arith("i", crate::instructions::ArithOp::Add, "i", 1)
        .jump("header");
    builder.block("exit").load("x", "q").ret(Some("x".into()));

    program.add_function(builder.build().unwrap());
    program
}
