use crate::chunk::{Chunk, OpCode};
use crate::ValueArray;
use num_traits::FromPrimitive;
use std::fmt;

/// Borrowed view pairing a [`Chunk`] with the constant pool it references.
/// Obtained through [`Chunk::disassemble`]; rendering happens via [`fmt::Display`].
pub struct Disassembler<'a> {
    chunk: &'a Chunk,
    constants: &'a ValueArray,
}

impl Chunk {
    /// Returns a [`Display`](fmt::Display)able instruction listing of this chunk.
    pub fn disassemble<'a>(&'a self, constants: &'a ValueArray) -> Disassembler<'a> {
        Disassembler {
            chunk: self,
            constants,
        }
    }
}

impl<'a> Disassembler<'a> {
    /// Disassemble simple (1 byte) instruction.
    fn simple_instr(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        offset: usize,
    ) -> Result<usize, fmt::Error> {
        writeln!(f, "{}", name)?;
        Ok(offset + 1)
    }

    /// Disassemble ldc (3 bytes) instruction, showing the constant's value.
    fn constant_instr(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        offset: usize,
    ) -> Result<usize, fmt::Error> {
        let constant_index = self.chunk.read_u16(offset + 1);
        let constant = &self.constants[constant_index as usize];
        writeln!(
            f,
            "{:<13} {:<5} (value = {})",
            name, constant_index, constant
        )?;
        Ok(offset + 3)
    }

    /// Disassemble an instruction with a single u16 operand (3 bytes).
    fn u16_instr(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        offset: usize,
    ) -> Result<usize, fmt::Error> {
        let operand = self.chunk.read_u16(offset + 1);
        writeln!(f, "{:<13} {}", name, operand)?;
        Ok(offset + 3)
    }

    /// Disassemble an instruction with a single u8 operand (2 bytes).
    fn u8_instr(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        offset: usize,
    ) -> Result<usize, fmt::Error> {
        let operand = self.chunk.code[offset + 1];
        writeln!(f, "{:<13} {}", name, operand)?;
        Ok(offset + 2)
    }

    /// Disassemble a closure (4 bytes) instruction.
    fn closure_instr(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        offset: usize,
    ) -> Result<usize, fmt::Error> {
        let constant_index = self.chunk.read_u16(offset + 1);
        let free_count = self.chunk.code[offset + 3];
        let constant = &self.constants[constant_index as usize];
        writeln!(
            f,
            "{:<13} {:<5} {:<5} (value = {})",
            name, constant_index, free_count, constant
        )?;
        Ok(offset + 4)
    }

    /// Disassembles the instruction at the `offset`.
    fn disassemble_instr(
        &self,
        f: &mut fmt::Formatter<'_>,
        offset: usize,
    ) -> Result<usize, fmt::Error> {
        write!(f, "{:04} ", offset)?;

        let instr = self.chunk.code[offset];

        match OpCode::from_u8(instr) {
            Some(OpCode::Ldc) => self.constant_instr(f, "ldc", offset),
            Some(OpCode::Pop) => self.simple_instr(f, "pop", offset),
            Some(OpCode::Add) => self.simple_instr(f, "add", offset),
            Some(OpCode::Sub) => self.simple_instr(f, "sub", offset),
            Some(OpCode::Mul) => self.simple_instr(f, "mul", offset),
            Some(OpCode::Div) => self.simple_instr(f, "div", offset),
            Some(OpCode::LdTrue) => self.simple_instr(f, "ld_true", offset),
            Some(OpCode::LdFalse) => self.simple_instr(f, "ld_false", offset),
            Some(OpCode::LdNull) => self.simple_instr(f, "ld_null", offset),
            Some(OpCode::Eq) => self.simple_instr(f, "eq", offset),
            Some(OpCode::NotEq) => self.simple_instr(f, "not_eq", offset),
            Some(OpCode::Greater) => self.simple_instr(f, "greater", offset),
            Some(OpCode::Not) => self.simple_instr(f, "not", offset),
            Some(OpCode::Neg) => self.simple_instr(f, "neg", offset),
            Some(OpCode::Jmp) => self.u16_instr(f, "jmp", offset),
            Some(OpCode::JmpNotTruthy) => self.u16_instr(f, "jmp_not_truthy", offset),
            Some(OpCode::StGlobal) => self.u16_instr(f, "st_global", offset),
            Some(OpCode::LdGlobal) => self.u16_instr(f, "ld_global", offset),
            Some(OpCode::StLoc) => self.u8_instr(f, "st_loc", offset),
            Some(OpCode::LdLoc) => self.u8_instr(f, "ld_loc", offset),
            Some(OpCode::NewArray) => self.u16_instr(f, "new_array", offset),
            Some(OpCode::NewHash) => self.u16_instr(f, "new_hash", offset),
            Some(OpCode::Index) => self.simple_instr(f, "index", offset),
            Some(OpCode::Calli) => self.u8_instr(f, "calli", offset),
            Some(OpCode::Ret) => self.simple_instr(f, "ret", offset),
            Some(OpCode::RetNull) => self.simple_instr(f, "ret_null", offset),
            Some(OpCode::LdFree) => self.u8_instr(f, "ld_free", offset),
            Some(OpCode::Closure) => self.closure_instr(f, "closure", offset),
            None => self.simple_instr(f, "invalid", offset), // skip bad instruction
        } // returns the next ip
    }
}

impl<'a> fmt::Display for Disassembler<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.chunk.name)?;

        let mut offset = 0;
        while offset < self.chunk.code.len() {
            offset = self.disassemble_instr(f, offset)?;
        }

        Ok(())
    }
}
