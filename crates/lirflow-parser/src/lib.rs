/*! Load textual LIR into the in-memory program model.
 *
 * LIR files are line oriented: one declaration, label or instruction per line. Each line is parsed
 * on its own with a small pest grammar, and [`loader`] assembles the lines into a
 * [`lirflow_core::Program`]. Lines that do not parse are skipped with a warning rather than
 * failing the whole file.
 */

use lirflow_core::{
    instructions::{ArithOp, Call, CallKind, CmpOp, Operation, Terminator},
    FunctionType, Operand, Type,
};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod loader;

pub use loader::{load, load_file};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct LirParser;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Syntax error: {0}")]
    Syntax(Box<pest::error::Error<Rule>>),
    #[error("Unsupported construct: {0}")]
    Unsupported(String),
}

impl ParseError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        ParseError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// One source line, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Blank,
    StructHeader {
        name: String,
        fields: Vec<(String, Type)>,
        closed: bool,
    },
    FunctionHeader {
        name: String,
        params: Vec<(String, Type)>,
        ret: Option<Type>,
    },
    Extern {
        name: String,
        signature: FunctionType,
    },
    Let(Vec<(String, Type)>),
    /// `name: type`, a struct field or a global depending on context.
    Declaration(String, Type),
    Label(String),
    Close,
    Operation(Operation),
    Terminator(Terminator),
}

pub fn parse_line(input: &str) -> Result<Line> {
    let mut pairs =
        LirParser::parse(Rule::line, input).map_err(|e| ParseError::Syntax(Box::new(e)))?;
    let line = pairs
        .next()
        .ok_or_else(|| ParseError::Unsupported(input.to_string()))?;

    let Some(item) = line.into_inner().find(|p| p.as_rule() != Rule::EOI) else {
        return Ok(Line::Blank);
    };

    match item.as_rule() {
        Rule::struct_header => {
            let mut inner = significant(item);
            let name = next_str(&mut inner, input)?;
            let mut fields = Vec::new();
            let mut closed = false;
            for pair in inner {
                match pair.as_rule() {
                    Rule::field_list => {
                        for field in pair.into_inner() {
                            fields.push(typed_name(field, input)?);
                        }
                    }
                    Rule::close_brace => closed = true,
                    _ => {}
                }
            }
            Ok(Line::StructHeader {
                name,
                fields,
                closed,
            })
        }
        Rule::fn_header => {
            let mut inner = significant(item);
            let name = next_str(&mut inner, input)?;
            let mut params = Vec::new();
            let mut ret = None;
            for pair in inner {
                match pair.as_rule() {
                    Rule::param_list => {
                        for param in pair.into_inner() {
                            params.push(typed_name(param, input)?);
                        }
                    }
                    Rule::ret_ty => ret = return_type(pair, input)?,
                    _ => {}
                }
            }
            Ok(Line::FunctionHeader { name, params, ret })
        }
        Rule::extern_decl => {
            let mut inner = significant(item);
            let name = next_str(&mut inner, input)?;
            let sig = inner
                .next()
                .ok_or_else(|| ParseError::Unsupported(input.to_string()))?;
            Ok(Line::Extern {
                name,
                signature: function_type(sig, input)?,
            })
        }
        Rule::let_decl => significant(item)
            .map(|pair| typed_name(pair, input))
            .collect::<Result<Vec<_>>>()
            .map(Line::Let),
        Rule::declaration => {
            let pair = item
                .into_inner()
                .next()
                .ok_or_else(|| ParseError::Unsupported(input.to_string()))?;
            let (name, ty) = typed_name(pair, input)?;
            Ok(Line::Declaration(name, ty))
        }
        Rule::block_label => {
            let mut inner = item.into_inner();
            Ok(Line::Label(next_str(&mut inner, input)?))
        }
        Rule::close_brace => Ok(Line::Close),
        Rule::instruction => {
            let inst = item
                .into_inner()
                .next()
                .ok_or_else(|| ParseError::Unsupported(input.to_string()))?;
            instruction(inst, input)
        }
        _ => Err(ParseError::Unsupported(input.to_string())),
    }
}

/// Children of `pair` without keyword and opcode tokens.
fn significant(pair: Pair<'_, Rule>) -> impl Iterator<Item = Pair<'_, Rule>> {
    pair.into_inner().filter(|p| !is_token(p.as_rule()))
}

fn is_token(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_struct
            | Rule::kw_fn
            | Rule::kw_extern
            | Rule::kw_let
            | Rule::kw_then
            | Rule::kw_ret
            | Rule::op_copy
            | Rule::op_arith
            | Rule::op_cmp
            | Rule::op_gep
            | Rule::op_gfp
            | Rule::op_alloc
            | Rule::op_addrof
            | Rule::op_load
            | Rule::op_store
            | Rule::op_jump
            | Rule::op_branch
            | Rule::op_ret
    )
}

/// `name` or `[name]` after an allocation size.
fn allocation_id(pair: Pair<'_, Rule>) -> String {
    match pair.as_rule() {
        Rule::alloc_id => pair.into_inner().as_str().to_string(),
        _ => pair.as_str().to_string(),
    }
}

fn next_str<'i>(inner: &mut impl Iterator<Item = Pair<'i, Rule>>, input: &str) -> Result<String> {
    inner
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| ParseError::Unsupported(input.to_string()))
}

fn next_operand<'i>(
    inner: &mut impl Iterator<Item = Pair<'i, Rule>>,
    input: &str,
) -> Result<Operand> {
    let pair = inner
        .next()
        .ok_or_else(|| ParseError::Unsupported(input.to_string()))?;
    operand(pair, input)
}

fn operand(pair: Pair<'_, Rule>, input: &str) -> Result<Operand> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::Unsupported(input.to_string()))?;
    match inner.as_rule() {
        Rule::int => inner
            .as_str()
            .parse::<i32>()
            .map(Operand::Const)
            .map_err(|_| ParseError::Unsupported(format!("integer out of range: {}", inner.as_str()))),
        _ => Ok(Operand::Var(inner.as_str().to_string())),
    }
}

fn typed_name(pair: Pair<'_, Rule>, input: &str) -> Result<(String, Type)> {
    let mut inner = pair.into_inner();
    let name = next_str(&mut inner, input)?;
    let ty = inner
        .next()
        .ok_or_else(|| ParseError::Unsupported(input.to_string()))?;
    Ok((name, parse_type(ty, input)?))
}

fn parse_type(pair: Pair<'_, Rule>, input: &str) -> Result<Type> {
    let pair = match pair.as_rule() {
        Rule::ty => pair
            .into_inner()
            .next()
            .ok_or_else(|| ParseError::Unsupported(input.to_string()))?,
        _ => pair,
    };
    match pair.as_rule() {
        Rule::int_ty => Ok(Type::Int),
        Rule::struct_ty => Ok(Type::Struct(pair.as_str().trim().to_string())),
        Rule::ptr_ty => {
            let inner = pair
                .into_inner()
                .next()
                .ok_or_else(|| ParseError::Unsupported(input.to_string()))?;
            Ok(Type::pointer(parse_type(inner, input)?))
        }
        Rule::fn_ty => Ok(Type::Function(Box::new(function_type(pair, input)?))),
        _ => Err(ParseError::Unsupported(pair.as_str().to_string())),
    }
}

fn function_type(pair: Pair<'_, Rule>, input: &str) -> Result<FunctionType> {
    let mut params = Vec::new();
    let mut ret = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ty => params.push(parse_type(inner, input)?),
            Rule::ret_ty => ret = return_type(inner, input)?,
            _ => {}
        }
    }
    Ok(FunctionType { params, ret })
}

fn return_type(pair: Pair<'_, Rule>, input: &str) -> Result<Option<Type>> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::Unsupported(input.to_string()))?;
    match inner.as_rule() {
        Rule::void_ty => Ok(None),
        _ => parse_type(inner, input).map(Some),
    }
}

fn instruction(pair: Pair<'_, Rule>, input: &str) -> Result<Line> {
    match pair.as_rule() {
        Rule::assign => {
            let mut inner = pair.into_inner();
            let dst = next_str(&mut inner, input)?;
            let rhs = inner
                .next()
                .ok_or_else(|| ParseError::Unsupported(input.to_string()))?;
            assignment(dst, rhs, input).map(Line::Operation)
        }
        Rule::store => {
            let mut inner = significant(pair);
            let dst = next_str(&mut inner, input)?;
            let value = next_operand(&mut inner, input)?;
            Ok(Line::Operation(Operation::Store { dst, value }))
        }
        Rule::call => call(None, pair, input).map(Line::Operation),
        Rule::jump => {
            let mut inner = significant(pair);
            Ok(Line::Terminator(Terminator::Jump(next_str(&mut inner, input)?)))
        }
        Rule::branch => {
            let mut inner = significant(pair);
            let cond = next_operand(&mut inner, input)?;
            let then_block = next_str(&mut inner, input)?;
            let else_block = next_str(&mut inner, input)?;
            Ok(Line::Terminator(Terminator::Branch {
                cond,
                then_block,
                else_block,
            }))
        }
        Rule::ret => {
            let value = pair
                .into_inner()
                .find(|p| p.as_rule() == Rule::operand)
                .map(|p| operand(p, input))
                .transpose()?;
            Ok(Line::Terminator(Terminator::Ret(value)))
        }
        _ => Err(ParseError::Unsupported(input.to_string())),
    }
}

fn assignment(dst: String, pair: Pair<'_, Rule>, input: &str) -> Result<Operation> {
    let rule = pair.as_rule();
    if rule == Rule::call {
        return call(Some(dst), pair, input);
    }

    let mut inner = significant(pair);
    let op = match rule {
        Rule::copy => Operation::Copy {
            dst,
            src: next_operand(&mut inner, input)?,
        },
        Rule::arith => {
            let op_str = next_str(&mut inner, input)?;
            let op = ArithOp::from_str(&op_str).ok_or(ParseError::Unsupported(op_str))?;
            Operation::Arith {
                dst,
                op,
                lhs: next_operand(&mut inner, input)?,
                rhs: next_operand(&mut inner, input)?,
            }
        }
        Rule::cmp => {
            let op_str = next_str(&mut inner, input)?;
            let op = CmpOp::from_str(&op_str).ok_or(ParseError::Unsupported(op_str))?;
            Operation::Cmp {
                dst,
                op,
                lhs: next_operand(&mut inner, input)?,
                rhs: next_operand(&mut inner, input)?,
            }
        }
        Rule::gep => Operation::Gep {
            dst,
            base: next_str(&mut inner, input)?,
            index: next_operand(&mut inner, input)?,
        },
        Rule::gfp => Operation::Gfp {
            dst,
            base: next_str(&mut inner, input)?,
            field: next_str(&mut inner, input)?,
        },
        Rule::alloc => Operation::Alloc {
            dst,
            size: next_operand(&mut inner, input)?,
            id: inner.next().map(allocation_id),
        },
        Rule::addrof => Operation::AddrOf {
            dst,
            src: next_str(&mut inner, input)?,
        },
        Rule::load => Operation::Load {
            dst,
            src: next_str(&mut inner, input)?,
        },
        _ => return Err(ParseError::Unsupported(input.to_string())),
    };
    Ok(op)
}

fn call(dst: Option<String>, pair: Pair<'_, Rule>, input: &str) -> Result<Operation> {
    let mut inner = pair.into_inner();
    let kind = match next_str(&mut inner, input)?.as_str() {
        "$call_ext" => CallKind::External,
        "$call_dir" => CallKind::Direct,
        "$call_idr" => CallKind::Indirect,
        other => return Err(ParseError::Unsupported(other.to_string())),
    };
    let callee = next_str(&mut inner, input)?;
    let args = inner
        .next()
        .ok_or_else(|| ParseError::Unsupported(input.to_string()))?
        .into_inner()
        .map(|p| operand(p, input))
        .collect::<Result<Vec<_>>>()?;
    let next = inner
        .find(|p| p.as_rule() == Rule::ident)
        .map(|p| p.as_str().to_string());

    Ok(Operation::Call(Call {
        dst,
        kind,
        callee,
        args,
        next,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(parse_line("").unwrap(), Line::Blank);
        assert_eq!(parse_line("   // nothing here").unwrap(), Line::Blank);
    }

    #[test]
    fn test_label_versus_declaration() {
        assert_eq!(parse_line("bb1:").unwrap(), Line::Label("bb1".to_string()));
        assert_eq!(
            parse_line("next: &Node;").unwrap(),
            Line::Declaration("next".to_string(), Type::pointer(Type::Struct("Node".into())))
        );
    }

    #[test]
    fn test_function_pointer_type() {
        let line = parse_line("let fp: &(int, &int) -> _, n: int").unwrap();
        assert_eq!(
            line,
            Line::Let(vec![
                (
                    "fp".to_string(),
                    Type::pointer(Type::function(vec![Type::Int, Type::pointer(Type::Int)], None))
                ),
                ("n".to_string(), Type::Int),
            ])
        );
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(parse_line("x = $frobnicate 3").is_err());
        assert!(parse_line("$jump").is_err());
    }
}
