//! Classic eight-symbol source text front end.
//!
//! `> < + - . , [ ]` map to `MoveBy`, `AddConst`, `Out`, `In`, and `Loop`;
//! every other character is a comment, as tradition demands. Rendering is
//! the partial inverse: it exists only for programs that stay within that
//! subset, with `MoveBy`/`AddConst` magnitudes spelled as repeated symbols.

use crate::instruction::Instruction;
use crate::program::Program;
use goedel_core::{Error, Result};

/// Parse source text into a program.
pub fn parse(source: &str) -> Result<Program> {
    let mut stack: Vec<Vec<Instruction>> = vec![Vec::new()];
    for (i, c) in source.char_indices() {
        let inst = match c {
            '>' => Instruction::MoveBy(1),
            '<' => Instruction::MoveBy(-1),
            '+' => Instruction::AddConst(1),
            '-' => Instruction::AddConst(-1),
            '.' => Instruction::Out,
            ',' => Instruction::In,
            '[' => {
                stack.push(Vec::new());
                continue;
            }
            ']' => {
                let body = stack.pop().expect("stack never empties below one");
                if stack.is_empty() {
                    return Err(Error::Parse(format!("unmatched ']' at byte {i}")));
                }
                Instruction::Loop(body)
            }
            _ => continue,
        };
        stack
            .last_mut()
            .expect("stack never empties below one")
            .push(inst);
    }
    if stack.len() > 1 {
        return Err(Error::Parse(format!(
            "{} unclosed '['",
            stack.len() - 1
        )));
    }
    Ok(Program::with_instructions(stack.pop().expect("top block")))
}

/// Render a program back to source text.
pub fn render(program: &Program) -> Result<String> {
    let mut out = String::new();
    render_block(program.instructions(), &mut out)?;
    Ok(out)
}

fn render_block(block: &[Instruction], out: &mut String) -> Result<()> {
    for inst in block {
        match inst {
            Instruction::MoveBy(k) => repeat(out, *k, '>', '<'),
            Instruction::AddConst(k) => repeat(out, *k, '+', '-'),
            Instruction::Out => out.push('.'),
            Instruction::In => out.push(','),
            Instruction::Loop(body) => {
                out.push('[');
                render_block(body, out)?;
                out.push(']');
            }
            other => {
                return Err(Error::Parse(format!(
                    "{:?} has no source form",
                    other.opcode()
                )))
            }
        }
    }
    Ok(())
}

fn repeat(out: &mut String, k: i64, pos: char, neg: char) {
    let c = if k >= 0 { pos } else { neg };
    for _ in 0..k.unsigned_abs() {
        out.push(c);
    }
}
