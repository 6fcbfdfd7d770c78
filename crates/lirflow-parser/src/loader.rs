use crate::{parse_line, Line, ParseError, Result};
use lirflow_core::{Function, Parameter, Program, StructDef};
use std::path::Path;
use tracing::{debug, warn};

enum State {
    Top,
    InStruct(StructDef),
    InFunction {
        function: Function,
        block: Option<String>,
    },
}

/// Reads and loads a LIR file.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Program> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| ParseError::io(path, e))?;
    debug!(path = %path.display(), bytes = source.len(), "loading program");
    Ok(load(&source))
}

/// Builds a program from LIR source. Lines that do not parse, or that make
/// no sense where they appear, are skipped with a warning.
pub fn load(source: &str) -> Program {
    let mut program = Program::new();
    let mut state = State::Top;

    for (number, raw) in source.lines().enumerate() {
        let number = number + 1;
        let text = raw.trim();
        if text.is_empty() {
            continue;
        }

        let line = match parse_line(text) {
            Ok(Line::Blank) => continue,
            Ok(line) => line,
            Err(e) => {
                warn!(line = number, text, error = %e, "skipping malformed line");
                continue;
            }
        };

        state = match (state, line) {
            (State::Top, Line::StructHeader { name, fields, closed }) => {
                let mut def = StructDef::new(name);
                for (field, ty) in fields {
                    def = def.with_field(field, ty);
                }
                if closed {
                    program.add_struct(def);
                    State::Top
                } else {
                    State::InStruct(def)
                }
            }
            (State::Top, Line::FunctionHeader { name, params, ret }) => {
                let mut function = Function::new(name);
                function.params = params
                    .into_iter()
                    .map(|(name, ty)| Parameter::new(name, ty))
                    .collect();
                function.ret = ret;
                State::InFunction {
                    function,
                    block: None,
                }
            }
            (State::Top, Line::Extern { name, signature }) => {
                program.add_extern(name, signature);
                State::Top
            }
            (State::Top, Line::Declaration(name, ty)) => {
                program.add_global(name, ty);
                State::Top
            }

            (State::InStruct(def), Line::Declaration(field, ty)) => {
                State::InStruct(def.with_field(field, ty))
            }
            (State::InStruct(def), Line::Close) => {
                program.add_struct(def);
                State::Top
            }

            (State::InFunction { mut function, block }, Line::Let(locals)) => {
                for (name, ty) in locals {
                    function.add_local(name, ty);
                }
                State::InFunction { function, block }
            }
            (State::InFunction { mut function, .. }, Line::Label(label)) => {
                function.block_mut(&label);
                State::InFunction {
                    function,
                    block: Some(label),
                }
            }
            (State::InFunction { mut function, block }, Line::Operation(op)) => {
                match &block {
                    Some(name) => {
                        if let Err(e) = function.block_mut(name).add_operation(op) {
                            warn!(line = number, error = %e, "skipping instruction");
                        }
                    }
                    None => warn!(line = number, text, "instruction outside a block"),
                }
                State::InFunction { function, block }
            }
            (State::InFunction { mut function, block }, Line::Terminator(term)) => {
                match &block {
                    Some(name) => {
                        if let Err(e) = function.block_mut(name).set_terminator(term) {
                            warn!(line = number, error = %e, "skipping terminator");
                        }
                    }
                    None => warn!(line = number, text, "terminator outside a block"),
                }
                State::InFunction { function, block }
            }
            (State::InFunction { function, .. }, Line::Close) => {
                debug!(
                    function = %function.name,
                    blocks = function.blocks.len(),
                    "loaded function"
                );
                program.add_function(function);
                State::Top
            }

            (state, _) => {
                warn!(line = number, text, "line not valid here, skipping");
                state
            }
        };
    }

    match state {
        State::Top => {}
        State::InStruct(def) => {
            warn!(name = %def.name, "struct not closed at end of input");
            program.add_struct(def);
        }
        State::InFunction { function, .. } => {
            warn!(name = %function.name, "function not closed at end of input");
            program.add_function(function);
        }
    }

    program
}
