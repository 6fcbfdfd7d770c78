use crate::{
    block::BasicBlock,
    function::Function,
    instructions::{Call, Instruction, Operation, ProgramPoint, Terminator},
    program::Program,
};
use std::fmt::{self, Write};

impl fmt::Display for ProgramPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramPoint::NonTerminal { block, index } => write!(f, "{}.{}", block, index),
            ProgramPoint::Terminal { block } => write!(f, "{}.term", block),
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dst) = &self.dst {
            write!(f, "{} = ", dst)?;
        }
        let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{} {}({})",
            self.kind.opcode().as_str(),
            self.callee,
            args.join(", ")
        )?;
        if let Some(next) = &self.next {
            write!(f, " then {}", next)?;
        }
        Ok(())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opcode = self.opcode().as_str();
        match self {
            Operation::Copy { dst, src } => write!(f, "{} = {} {}", dst, opcode, src),
            Operation::Arith { dst, op, lhs, rhs } => {
                write!(f, "{} = {} {} {} {}", dst, opcode, op.as_str(), lhs, rhs)
            }
            Operation::Cmp { dst, op, lhs, rhs } => {
                write!(f, "{} = {} {} {} {}", dst, opcode, op.as_str(), lhs, rhs)
            }
            Operation::Gep { dst, base, index } => {
                write!(f, "{} = {} {} {}", dst, opcode, base, index)
            }
            Operation::Gfp { dst, base, field } => {
                write!(f, "{} = {} {} {}", dst, opcode, base, field)
            }
            Operation::Alloc { dst, size, id } => match id {
                Some(id) => write!(f, "{} = {} {} [{}]", dst, opcode, size, id),
                None => write!(f, "{} = {} {}", dst, opcode, size),
            },
            Operation::AddrOf { dst, src } | Operation::Load { dst, src } => {
                write!(f, "{} = {} {}", dst, opcode, src)
            }
            Operation::Store { dst, value } => write!(f, "{} {} {}", opcode, dst, value),
            Operation::Call(call) => write!(f, "{}", call),
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opcode = self.opcode().as_str();
        match self {
            Terminator::Jump(target) => write!(f, "{} {}", opcode, target),
            Terminator::Branch {
                cond,
                then_block,
                else_block,
            } => write!(f, "{} {} {} {}", opcode, cond, then_block, else_block),
            Terminator::Ret(Some(value)) => write!(f, "{} {}", opcode, value),
            Terminator::Ret(None) => write!(f, "{}", opcode),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::NonTerminal { op, .. } => write!(f, "{}", op),
            Instruction::Terminal { term, .. } => write!(f, "{}", term),
        }
    }
}

/// Renders a program back to LIR text the loader accepts.
pub fn format_program(program: &Program) -> String {
    let mut output = String::new();

    for def in program.structs.values() {
        writeln!(&mut output, "struct {} {{", def.name).unwrap();
        for (field, ty) in &def.fields {
            writeln!(&mut output, "  {}: {}", field, ty).unwrap();
        }
        writeln!(&mut output, "}}").unwrap();
    }

    for (name, ty) in &program.globals {
        writeln!(&mut output, "{}: {}", name, ty).unwrap();
    }

    for (name, sig) in &program.externs {
        writeln!(&mut output, "extern {}: {}", name, sig).unwrap();
    }

    for function in program.functions.values() {
        writeln!(&mut output).unwrap();
        write!(&mut output, "{}", format_function(function)).unwrap();
    }

    output
}

pub fn format_function(function: &Function) -> String {
    let mut output = String::new();

    let params: Vec<String> = function
        .params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.param_type))
        .collect();
    write!(&mut output, "fn {}({})", function.name, params.join(", ")).unwrap();
    if let Some(ret) = &function.ret {
        write!(&mut output, " -> {}", ret).unwrap();
    }
    writeln!(&mut output, " {{").unwrap();

    if !function.locals.is_empty() {
        let locals: Vec<String> = function
            .locals
            .iter()
            .map(|(name, ty)| format!("{}: {}", name, ty))
            .collect();
        writeln!(&mut output, "let {}", locals.join(", ")).unwrap();
    }

    for block in function.blocks.values() {
        write!(&mut output, "{}", format_block(block)).unwrap();
    }

    writeln!(&mut output, "}}").unwrap();
    output
}

pub fn format_block(block: &BasicBlock) -> String {
    let mut output = String::new();
    writeln!(&mut output, "{}:", block.name).unwrap();
    for inst in &block.instructions {
        writeln!(&mut output, "  {}", inst).unwrap();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::{ArithOp, CallKind};
    use crate::values::Operand;

    #[test]
    fn test_program_point_display() {
        assert_eq!(ProgramPoint::at("entry", 3).to_string(), "entry.3");
        assert_eq!(ProgramPoint::terminal("bb1").to_string(), "bb1.term");
    }

    #[test]
    fn test_operation_display() {
        let arith = Operation::Arith {
            dst: "t".to_string(),
            op: ArithOp::Mul,
            lhs: Operand::var("x"),
            rhs: Operand::Const(2),
        };
        assert_eq!(arith.to_string(), "t = $arith mul x 2");

        let call = Operation::Call(Call {
            dst: None,
            kind: CallKind::Indirect,
            callee: "fp".to_string(),
            args: vec![Operand::var("a"), Operand::var("b")],
            next: Some("bb2".to_string()),
        });
        assert_eq!(call.to_string(), "$call_idr fp(a, b) then bb2");

        let store = Operation::Store {
            dst: "p".to_string(),
            value: Operand::Const(7),
        };
        assert_eq!(store.to_string(), "$store p 7");
    }

    #[test]
    fn test_terminator_display() {
        let branch = Terminator::Branch {
            cond: Operand::var("c"),
            then_block: "bb1".to_string(),
            else_block: "bb2".to_string(),
        };
        assert_eq!(branch.to_string(), "$branch c bb1 bb2");
        assert_eq!(Terminator::Ret(None).to_string(), "$ret");
    }
}
