//! Variable-length signed integer coding: zigzag + Golomb-Rice.
//!
//! Signed values are first folded to unsigned with the zigzag mapping so
//! small magnitudes of either sign stay small, then Golomb-coded against a
//! divisor `m`: unary quotient (q zero-bits and a terminating one-bit)
//! followed by a truncated-binary remainder. `m = 1` degenerates to pure
//! unary; powers of two are plain Rice codes.

use crate::bits::{BitReader, BitVec};
use goedel_core::{Error, Result};

/// Largest Golomb divisor the format selector searches.
pub const MAX_DIVISOR: u32 = 16;

/// Encode-side cap on the unary quotient. Cost grows linearly with
/// magnitude, so past this point the operand is rejected instead of
/// materializing a kilobyte-scale unary run. Decoding needs no cap: the
/// input stream itself bounds the run.
const MAX_QUOTIENT: u64 = 65_535;

pub fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

pub fn zigzag_decode(u: u64) -> i64 {
    ((u >> 1) as i64) ^ -((u & 1) as i64)
}

/// `ceil(log2(m))` as the remainder field width, via bitlength(m - 1).
fn remainder_width(m: u32) -> u32 {
    32 - (m - 1).leading_zeros()
}

/// Append the Golomb-Rice code of `n` under divisor `m`.
pub fn write_golomb(bits: &mut BitVec, n: i64, m: u32) -> Result<()> {
    debug_assert!((1..=MAX_DIVISOR).contains(&m));
    let u = zigzag_encode(n);
    let q = u / m as u64;
    let r = u % m as u64;
    if q > MAX_QUOTIENT {
        return Err(Error::Range(format!(
            "operand {n} too large for Golomb divisor {m}"
        )));
    }
    for _ in 0..q {
        bits.push(false);
    }
    bits.push(true);

    let k = remainder_width(m);
    let t = (1u64 << k) - m as u64;
    if r < t {
        bits.push_bits(r, k as usize - 1);
    } else {
        bits.push_bits(r + t, k as usize);
    }
    Ok(())
}

/// Read one Golomb-Rice code under divisor `m`. A stream that runs out
/// before the terminating one-bit is malformed.
pub fn read_golomb(bits: &mut BitReader<'_>, m: u32) -> Result<i64> {
    debug_assert!((1..=MAX_DIVISOR).contains(&m));
    let mut q = 0u64;
    while !bits.read_bit()? {
        q += 1;
    }

    let k = remainder_width(m);
    let t = (1u64 << k) - m as u64;
    let r = if k == 0 {
        0
    } else {
        let x = bits.read_bits(k as usize - 1)?;
        if x < t {
            x
        } else {
            ((x << 1) | bits.read_bit()? as u64) - t
        }
    };
    Ok(zigzag_decode(q * m as u64 + r))
}
