//! The tape machine.

use crate::MachineConfig;
use goedel_core::{Error, Result};
use goedel_ir::{Instruction, Program};
use std::collections::HashMap;

/// Run a program against an input byte stream with the default (unbounded)
/// configuration.
pub fn execute(program: &Program, input: &[u8]) -> Result<Vec<u8>> {
    Machine::new(MachineConfig::default()).run(program, input)
}

/// A tape machine instance. Reusable: each [`Machine::run`] starts from a
/// cleared tape.
pub struct Machine {
    config: MachineConfig,
    tape: HashMap<i64, i64>,
    ptr: i64,
    fuel_used: u64,
}

struct Io<'a> {
    input: &'a [u8],
    pos: usize,
    out: Vec<u8>,
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            config,
            tape: HashMap::new(),
            ptr: 0,
            fuel_used: 0,
        }
    }

    /// Instruction dispatches of the last run.
    pub fn fuel_consumed(&self) -> u64 {
        self.fuel_used
    }

    /// Read a cell (0 if never written). Mostly useful to inspect final
    /// machine state after a run.
    pub fn cell(&self, index: i64) -> i64 {
        self.tape.get(&index).copied().unwrap_or(0)
    }

    pub fn run(&mut self, program: &Program, input: &[u8]) -> Result<Vec<u8>> {
        self.tape.clear();
        self.ptr = 0;
        self.fuel_used = 0;
        let mut io = Io {
            input,
            pos: 0,
            out: Vec::new(),
        };
        self.exec_block(program.instructions(), &mut io)?;
        tracing::debug!(fuel = self.fuel_used, out_bytes = io.out.len(), "run finished");
        Ok(io.out)
    }

    fn exec_block(&mut self, block: &[Instruction], io: &mut Io<'_>) -> Result<()> {
        for inst in block {
            self.fuel_used += 1;
            if let Some(max) = self.config.max_steps {
                if self.fuel_used > max {
                    return Err(Error::Fuel(format!("exceeded {max} steps")));
                }
            }

            match inst {
                Instruction::MoveBy(k) => self.ptr = self.ptr.wrapping_add(*k),
                Instruction::AddConst(k) => self.set(self.ptr, self.get(self.ptr).wrapping_add(*k)),
                Instruction::SetConst(k) => self.set(self.ptr, *k),
                Instruction::AddFrom(k) => {
                    self.set(self.ptr, self.get(self.ptr).wrapping_add(self.at(*k)))
                }
                Instruction::SubFrom(k) => {
                    self.set(self.ptr, self.get(self.ptr).wrapping_sub(self.at(*k)))
                }
                Instruction::CopyTo(k) => self.set(self.ptr.wrapping_add(*k), self.get(self.ptr)),
                Instruction::SwapWith(k) => {
                    let other = self.ptr.wrapping_add(*k);
                    let a = self.get(self.ptr);
                    let b = self.get(other);
                    self.set(self.ptr, b);
                    self.set(other, a);
                }
                Instruction::MulFrom(k) => {
                    self.set(self.ptr, self.get(self.ptr).wrapping_mul(self.at(*k)))
                }
                Instruction::MulConst(k) => {
                    self.set(self.ptr, self.get(self.ptr).wrapping_mul(*k))
                }
                Instruction::DivFrom(k) => {
                    let divisor = self.at(*k);
                    if divisor == 0 {
                        return Err(Error::DivisionByZero);
                    }
                    self.set(self.ptr, floor_div(self.get(self.ptr), divisor));
                }
                Instruction::DivConst(k) => {
                    if *k == 0 {
                        return Err(Error::DivisionByZero);
                    }
                    self.set(self.ptr, floor_div(self.get(self.ptr), *k));
                }
                Instruction::Loop(body) => {
                    while self.get(self.ptr) != 0 {
                        self.exec_block(body, io)?;
                    }
                }
                Instruction::IfZero(body) => {
                    if self.get(self.ptr) == 0 {
                        self.exec_block(body, io)?;
                    }
                }
                Instruction::Out => emit(self.get(self.ptr), &mut io.out),
                Instruction::In => {
                    let value = match io.next_token() {
                        Some(chunk) => token_value(chunk)?,
                        None => 0,
                    };
                    self.set(self.ptr, value);
                }
            }
        }
        Ok(())
    }

    fn get(&self, index: i64) -> i64 {
        self.tape.get(&index).copied().unwrap_or(0)
    }

    fn at(&self, offset: i64) -> i64 {
        self.get(self.ptr.wrapping_add(offset))
    }

    fn set(&mut self, index: i64, value: i64) {
        self.tape.insert(index, value);
    }
}

impl<'a> Io<'a> {
    /// Next newline-delimited token, or `None` once the input is spent.
    /// The delimiter is consumed and an empty line is an empty token.
    fn next_token(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.input.len() {
            return None;
        }
        let rest = &self.input[self.pos..];
        match rest.iter().position(|&b| b == b'\n') {
            Some(nl) => {
                self.pos += nl + 1;
                Some(&rest[..nl])
            }
            None => {
                self.pos = self.input.len();
                Some(rest)
            }
        }
    }
}

/// Interpret a token as a signed big-endian integer; empty reads as 0.
fn token_value(chunk: &[u8]) -> Result<i64> {
    if chunk.is_empty() {
        return Ok(0);
    }
    if chunk.len() > 8 {
        return Err(Error::Range(format!(
            "input token of {} bytes exceeds the 64-bit cell",
            chunk.len()
        )));
    }
    let mut value: i64 = if chunk[0] & 0x80 != 0 { -1 } else { 0 };
    for &b in chunk {
        value = (value << 8) | b as i64;
    }
    Ok(value)
}

/// Append the minimal-length signed big-endian encoding of a cell,
/// `max(1, (bitlength(|v|) + 8) / 8)` bytes as in the classic output rule.
fn emit(value: i64, out: &mut Vec<u8>) {
    let magnitude_bits = (64 - value.unsigned_abs().leading_zeros()) as usize;
    let nbytes = ((magnitude_bits + 8) / 8).max(1);
    if nbytes > 8 {
        // Only i64::MIN needs a ninth sign byte.
        out.push(0xFF);
        out.extend_from_slice(&value.to_be_bytes());
    } else {
        out.extend_from_slice(&value.to_be_bytes()[8 - nbytes..]);
    }
}

/// Floor division, matching the reference semantics rather than Rust's
/// truncating `/`.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(program: Vec<Instruction>, input: &[u8]) -> Vec<u8> {
        execute(&Program::with_instructions(program), input).unwrap()
    }

    /// Set the cell to 72 and emit it: one byte, 'H'. The same holds after
    /// a trip through the integer codec.
    #[test]
    fn test_emit_single_byte() {
        assert_eq!(
            run(vec![Instruction::AddConst(72), Instruction::Out], b""),
            b"H"
        );

        let program =
            Program::with_instructions(vec![Instruction::AddConst(72), Instruction::Out]);
        let n = program.encode().unwrap();
        let decoded = Program::decode(&n).unwrap();
        assert_eq!(execute(&decoded, b"").unwrap(), b"H");
    }

    #[test]
    fn test_emit_widths() {
        let mut out = Vec::new();
        emit(0, &mut out);
        emit(127, &mut out);
        emit(128, &mut out);
        emit(-128, &mut out);
        assert_eq!(out, vec![0x00, 0x7F, 0x00, 0x80, 0xFF, 0x80]);
    }

    #[test]
    fn test_input_tokens() {
        assert_eq!(token_value(b"").unwrap(), 0);
        assert_eq!(token_value(b"\x05").unwrap(), 5);
        assert_eq!(token_value(b"\x01\x00").unwrap(), 256);
        assert_eq!(token_value(b"\xFF").unwrap(), -1);
        assert_eq!(token_value(b"\xFF\x80").unwrap(), -128);
        assert!(token_value(b"\x01\x02\x03\x04\x05\x06\x07\x08\x09").is_err());
    }

    #[test]
    fn test_input_exhaustion_reads_zero() {
        // Two reads, one token: the second read stores 0.
        let program = vec![
            Instruction::In,
            Instruction::Out,
            Instruction::In,
            Instruction::Out,
        ];
        assert_eq!(run(program, b"\x2A"), vec![42, 0]);
    }

    #[test]
    fn test_floor_division() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(floor_div(7, -2), -4);
        assert_eq!(floor_div(-7, -2), 3);

        let program = vec![Instruction::SetConst(-7), Instruction::DivConst(2), Instruction::Out];
        assert_eq!(run(program, b""), vec![0xFC]); // -4
    }

    #[test]
    fn test_division_by_zero() {
        let program = Program::with_instructions(vec![
            Instruction::SetConst(0),
            Instruction::DivConst(0),
        ]);
        assert!(matches!(
            execute(&program, b""),
            Err(Error::DivisionByZero)
        ));

        let program = Program::with_instructions(vec![
            Instruction::SetConst(1),
            Instruction::DivFrom(1),
        ]);
        assert!(matches!(
            execute(&program, b""),
            Err(Error::DivisionByZero)
        ));
    }

    #[test]
    fn test_if_zero() {
        let program = vec![
            Instruction::IfZero(vec![Instruction::AddConst(10)]),
            Instruction::IfZero(vec![Instruction::AddConst(99)]),
            Instruction::Out,
        ];
        assert_eq!(run(program, b""), vec![10]);
    }

    #[test]
    fn test_fuel_budget_stops_runaway_loop() {
        // The truth machine: echoes 0 once, echoes 1 forever.
        let truth_machine = Program::with_instructions(vec![
            Instruction::In,
            Instruction::IfZero(vec![Instruction::Out]),
            Instruction::Loop(vec![Instruction::Out]),
        ]);

        assert_eq!(execute(&truth_machine, b"\x00").unwrap(), vec![0]);

        let mut machine = Machine::new(MachineConfig {
            max_steps: Some(10_000),
        });
        let err = machine.run(&truth_machine, b"\x01").unwrap_err();
        assert!(matches!(err, Error::Fuel(_)));
        assert_eq!(machine.fuel_consumed(), 10_001);
    }

    /// Classic demo programs, each checked two ways: the expected output,
    /// and that an encode/decode round trip leaves behavior untouched.
    mod demos {
        use super::*;
        use Instruction::*;

        fn check(program: Vec<Instruction>, input: &[u8], expected: &[u8]) {
            let program = Program::with_instructions(program);
            assert_eq!(execute(&program, input).unwrap(), expected);

            let n = program.encode().unwrap();
            let decoded = Program::decode(&n).unwrap();
            assert_eq!(decoded, program);
            assert_eq!(execute(&decoded, input).unwrap(), expected);
        }

        #[test]
        fn test_hello_world() {
            check(
                vec![
                    AddConst(72), Out,
                    AddConst(29), Out,
                    AddConst(7), Out, Out,
                    AddConst(3), Out,
                    AddConst(-67), Out,
                    AddConst(-12), Out,
                    AddConst(55), Out,
                    AddConst(24), Out,
                    AddConst(3), Out,
                    AddConst(-6), Out,
                    AddConst(-8), Out,
                    AddConst(-67), Out,
                ],
                b"",
                b"Hello, World!",
            );
        }

        #[test]
        fn test_factorial() {
            let factorial = vec![
                In,
                MoveBy(1), SetConst(1),
                MoveBy(-1),
                Loop(vec![
                    MoveBy(1), MulFrom(-1),
                    MoveBy(-1), AddConst(-1),
                ]),
                MoveBy(1), Out,
            ];
            check(factorial, b"\x05", &[120]);
        }

        #[test]
        fn test_sqrt_by_odd_numbers() {
            // 1 + 3 + 5 + ... + (2n-1) = n^2
            let sqrt = vec![
                In,
                MoveBy(1), AddConst(1),
                MoveBy(-1),
                Loop(vec![
                    SubFrom(1),
                    MoveBy(1), AddConst(2),
                    MoveBy(1), AddConst(1),
                    MoveBy(-2),
                ]),
                MoveBy(2), Out,
            ];
            check(sqrt, b"\x10", &[4]);
        }

        #[test]
        fn test_fibonacci() {
            let fibonacci = vec![
                In,
                MoveBy(2), SetConst(1),
                MoveBy(-2),
                Loop(vec![
                    AddConst(-1),
                    MoveBy(1), AddFrom(1),
                    SwapWith(1),
                    MoveBy(-1),
                ]),
                MoveBy(1), Out,
            ];
            check(fibonacci, b"\x0A", &[55]);
        }

        #[test]
        fn test_gcd_euclid() {
            let gcd = vec![
                In,
                MoveBy(1), In,
                Loop(vec![
                    MoveBy(-1),
                    CopyTo(2),
                    DivFrom(1), MulFrom(1),
                    SwapWith(2),
                    SubFrom(2),
                    SwapWith(1),
                    MoveBy(1),
                ]),
                MoveBy(-1), Out,
            ];
            check(gcd, b"\x30\n\x12", &[6]);
        }

        #[test]
        fn test_power() {
            let power = vec![
                In,
                MoveBy(1), In,
                MoveBy(1), SetConst(1),
                MoveBy(-1),
                Loop(vec![
                    AddConst(-1),
                    MoveBy(1), MulFrom(-2),
                    MoveBy(-1),
                ]),
                MoveBy(1), Out,
            ];
            check(power, b"\x03\n\x04", &[81]);
        }

        #[test]
        fn test_triangular_number() {
            let triangular = vec![
                In,
                CopyTo(1), MoveBy(1), AddConst(1),
                MoveBy(-1), MulFrom(1),
                DivConst(2),
                Out,
            ];
            check(triangular, b"\x07", &[28]);
        }

        #[test]
        fn test_collatz_steps() {
            // Counts iterations until n stabilizes at 1. The odd branch is
            // the degenerate run-once loop guarded by SetConst(0).
            let collatz = vec![
                In, AddConst(-1),
                Loop(vec![
                    AddConst(1),
                    CopyTo(2), CopyTo(3),
                    MoveBy(2), DivConst(2),
                    MoveBy(1),
                    SubFrom(-1), SubFrom(-1),
                    IfZero(vec![
                        MoveBy(-1), CopyTo(-2),
                        MoveBy(1),
                    ]),
                    Loop(vec![
                        SetConst(0),
                        MoveBy(-3),
                        MulConst(3), AddConst(1),
                        MoveBy(3),
                    ]),
                    MoveBy(-3), AddConst(-1),
                    MoveBy(1), AddConst(1),
                    MoveBy(-1),
                ]),
                MoveBy(1), Out,
            ];
            check(collatz, b"\x06", &[8]);
        }
    }

    #[test]
    fn test_machine_state_resets_between_runs() {
        let program = Program::with_instructions(vec![
            Instruction::AddConst(1),
            Instruction::Out,
        ]);
        let mut machine = Machine::new(MachineConfig::default());
        assert_eq!(machine.run(&program, b"").unwrap(), vec![1]);
        assert_eq!(machine.run(&program, b"").unwrap(), vec![1]);
        assert_eq!(machine.cell(0), 1);
        assert_eq!(machine.fuel_consumed(), 2);
    }
}
