use super::FunctionBuilder;
use crate::{
    instructions::{ArithOp, Call, CallKind, CmpOp, Operation, Terminator},
    values::Operand,
};

pub struct BlockBuilder<'a> {
    builder: &'a mut FunctionBuilder,
    name: String,
}

impl<'a> BlockBuilder<'a> {
    pub(super) fn new(builder: &'a mut FunctionBuilder, name: &str) -> Self {
        Self {
            builder,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn push(&mut self, op: Operation) -> &mut Self {
        let result = self.builder.function_mut().block_mut(&self.name).add_operation(op);
        if let Err(e) = result {
            self.builder.record_error(e);
        }
        self
    }

    fn terminate(&mut self, term: Terminator) -> &mut Self {
        let result = self
            .builder
            .function_mut()
            .block_mut(&self.name)
            .set_terminator(term);
        if let Err(e) = result {
            self.builder.record_error(e);
        }
        self
    }

    pub fn copy(&mut self, dst: &str, src: impl Into<Operand>) -> &mut Self {
        self.push(Operation::Copy {
            dst: dst.to_string(),
            src: src.into(),
        })
    }

    pub fn arith(
        &mut self,
        dst: &str,
        op: ArithOp,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
    ) -> &mut Self {
        self.push(Operation::Arith {
            dst: dst.to_string(),
            op,
            lhs: lhs.into(),
            rhs: rhs.into(),
        })
    }

    pub fn cmp(
        &mut self,
        dst: &str,
        op: CmpOp,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
    ) -> &mut Self {
        self.push(Operation::Cmp {
            dst: dst.to_string(),
            op,
            lhs: lhs.into(),
            rhs: rhs.into(),
        })
    }

    pub fn gep(&mut self, dst: &str, base: &str, index: impl Into<Operand>) -> &mut Self {
        self.push(Operation::Gep {
            dst: dst.to_string(),
            base: base.to_string(),
            index: index.into(),
        })
    }

    pub fn gfp(&mut self, dst: &str, base: &str, field: &str) -> &mut Self {
        self.push(Operation::Gfp {
            dst: dst.to_string(),
            base: base.to_string(),
            field: field.to_string(),
        })
    }

    pub fn alloc(&mut self, dst: &str, size: impl Into<Operand>) -> &mut Self {
        self.push(Operation::Alloc {
            dst: dst.to_string(),
            size: size.into(),
            id: None,
        })
    }

    pub fn addrof(&mut self, dst: &str, src: &str) -> &mut Self {
        self.push(Operation::AddrOf {
            dst: dst.to_string(),
            src: src.to_string(),
        })
    }

    pub fn load(&mut self, dst: &str, src: &str) -> &mut Self {
        self.push(Operation::Load {
            dst: dst.to_string(),
            src: src.to_string(),
        })
    }

    pub fn store(&mut self, dst: &str, value: impl Into<Operand>) -> &mut Self {
        self.push(Operation::Store {
            dst: dst.to_string(),
            value: value.into(),
        })
    }

    pub fn call(
        &mut self,
        kind: CallKind,
        dst: Option<&str>,
        callee: &str,
        args: Vec<Operand>,
        next: Option<&str>,
    ) -> &mut Self {
        self.push(Operation::Call(Call {
            dst: dst.map(str::to_string),
            kind,
            callee: callee.to_string(),
            args,
            next: next.map(str::to_string),
        }))
    }

    pub fn call_ext(&mut self, dst: Option<&str>, callee: &str, args: Vec<Operand>) -> &mut Self {
        self.call(CallKind::External, dst, callee, args, None)
    }

    pub fn jump(&mut self, target: &str) -> &mut Self {
        self.terminate(Terminator::Jump(target.to_string()))
    }

    pub fn branch(
        &mut self,
        cond: impl Into<Operand>,
        then_block: &str,
        else_block: &str,
    ) -> &mut Self {
        self.terminate(Terminator::Branch {
            cond: cond.into(),
            then_block: then_block.to_string(),
            else_block: else_block.to_string(),
        })
    }

    pub fn ret(&mut self, value: Option<Operand>) -> &mut Self {
        self.terminate(Terminator::Ret(value))
    }
}
