//! CIL method body scanning.
//!
//! A single linear pass over the instruction stream, decoding only operand
//! sizes. No control flow is followed.

use crate::clr::bytes::{slice, u16_at, u32_at, u8_at};
use crate::clr::{ImageError, ImageResult};

const LDSTR: u8 = 0x72;
const SWITCH: u8 = 0x45;
const PREFIX: u8 = 0xFE;
const USER_STRING_TABLE: u32 = 0x70;

/// Returns the IL code bytes of the method body at `offset`.
pub fn method_code(data: &[u8], offset: usize) -> ImageResult<&[u8]> {
    let first = u8_at(data, offset)?;
    match first & 0x03 {
        // Tiny header: code size in the upper six bits.
        0x02 => slice(data, offset + 1, usize::from(first >> 2)),
        0x03 => {
            let flags = u16_at(data, offset)?;
            let header = usize::from(flags >> 12) * 4;
            let size = u32_at(data, offset + 4)? as usize;
            slice(data, offset + header, size)
        }
        _ => Err(ImageError::new(format!(
            "invalid method header {first:#x} at offset {offset:#x}"
        ))),
    }
}

/// `#US` offsets of every `ldstr` operand, in instruction order.
pub fn string_literals(code: &[u8]) -> ImageResult<Vec<u32>> {
    let mut literals = Vec::new();
    let mut at = 0;

    while at < code.len() {
        let op = code[at];
        at += 1;

        let operand = if op == PREFIX {
            let op2 = u8_at(code, at)?;
            at += 1;
            two_byte_operand(op2).ok_or_else(|| unknown(op2, at))?
        } else if op == SWITCH {
            let targets = u32_at(code, at)? as usize;
            4 + targets * 4
        } else {
            one_byte_operand(op).ok_or_else(|| unknown(op, at))?
        };

        if op == LDSTR {
            let token = u32_at(code, at)?;
            if token >> 24 == USER_STRING_TABLE {
                literals.push(token & 0x00FF_FFFF);
            }
        }

        at += operand;
    }

    Ok(literals)
}

fn unknown(op: u8, at: usize) -> ImageError {
    ImageError::new(format!("unknown opcode {op:#x} at IL offset {:#x}", at - 1))
}

/// Operand size of a one-byte opcode (ECMA-335 III).
fn one_byte_operand(op: u8) -> Option<usize> {
    let size = match op {
        0x00..=0x0D => 0,
        0x0E..=0x13 => 1,
        0x14..=0x1E => 0,
        0x1F => 1,
        0x20 => 4,
        0x21 => 8,
        0x22 => 4,
        0x23 => 8,
        0x25 | 0x26 => 0,
        0x27..=0x29 => 4,
        0x2A => 0,
        0x2B..=0x37 => 1,
        0x38..=0x44 => 4,
        0x46..=0x6E => 0,
        0x6F..=0x75 => 4,
        0x76 => 0,
        0x79 => 4,
        0x7A => 0,
        0x7B..=0x81 => 4,
        0x82..=0x8B => 0,
        0x8C | 0x8D => 4,
        0x8E => 0,
        0x8F => 4,
        0x90..=0xA2 => 0,
        0xA3..=0xA5 => 4,
        0xB3..=0xBA => 0,
        0xC2 => 4,
        0xC3 => 0,
        0xC6 => 4,
        0xD0 => 4,
        0xD1..=0xDC => 0,
        0xDD => 4,
        0xDE => 1,
        0xDF | 0xE0 => 0,
        _ => return None,
    };
    Some(size)
}

/// Operand size of a `0xFE`-prefixed opcode.
fn two_byte_operand(op: u8) -> Option<usize> {
    let size = match op {
        0x00..=0x05 => 0,
        0x06 | 0x07 => 4,
        0x09..=0x0E => 2,
        0x0F | 0x11 => 0,
        0x12 => 1,
        0x13 | 0x14 => 0,
        0x15 | 0x16 => 4,
        0x17 | 0x18 => 0,
        0x19 => 1,
        0x1A => 0,
        0x1C => 4,
        0x1D | 0x1E => 0,
        _ => return None,
    };
    Some(size)
}
