//! Order-independent floating-point summation.
//!
//! Every finite `f64` is an integer multiple of `2^-1074` with magnitude
//! below `2^1024`, so [`ExactSum`] keeps the running total as a wide
//! fixed-point integer in base-`2^32` limbs (a Kulisch accumulator). Adding
//! a value is integer addition, which is exact and associative, and
//! [`ExactSum::value`] rounds the exact total once. Two threads adding the
//! same multiset of values in different interleavings read back the same
//! bits, including totals whose intermediate values exceed `f64::MAX`.

/// Base-2^32 digits. 64 cover every finite `f64` (bit 2098 at most); the
/// rest absorb the growth of a sum of up to `2^63` values.
const LIMBS: usize = 68;

/// Bits per limb digit.
const DIGIT_BITS: u32 = 32;

const DIGIT_MASK: i128 = (1 << DIGIT_BITS) - 1;

/// Exponent of the least significant bit of limb 0.
const LSB_EXPONENT: i32 = -1074;

/// Adds before the limbs must be normalized. Each add moves a limb by less
/// than `2^32`, and a normalized limb leaves `2^31` of `i64` headroom.
const ADDS_PER_NORMALIZE: u32 = 1 << 30;

/// Exact running sum of `f64` values.
#[derive(Debug, Clone)]
pub struct ExactSum {
    /// Signed digits; the total is `sum(limbs[i] * 2^(32 i - 1074))`.
    limbs: [i64; LIMBS],
    /// Adds since the last normalization.
    pending: u32,
    /// IEEE sum of every non-finite input.
    non_finite: Option<f64>,
}

impl Default for ExactSum {
    fn default() -> Self {
        Self {
            limbs: [0; LIMBS],
            pending: 0,
            non_finite: None,
        }
    }
}

impl ExactSum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the running total.
    ///
    /// NaN and infinities are not rejected: they are summed with ordinary
    /// IEEE rules on a side channel (`inf + -inf = NaN`, NaN is sticky) and
    /// dominate [`value`](Self::value).
    pub fn add(&mut self, value: f64) {
        if !value.is_finite() {
            self.absorb_non_finite(value);
            return;
        }
        if value == 0.0 {
            return;
        }

        let (mantissa, position) = decompose(value);
        let index = (position / DIGIT_BITS) as usize;
        let mut wide = i128::from(mantissa) << (position % DIGIT_BITS);

        // `wide` spans at most 85 bits: two masked digits plus a signed rest.
        self.limbs[index] += (wide & DIGIT_MASK) as i64;
        wide >>= DIGIT_BITS;
        self.limbs[index + 1] += (wide & DIGIT_MASK) as i64;
        wide >>= DIGIT_BITS;
        self.limbs[index + 2] += wide as i64;

        self.pending += 1;
        if self.pending == ADDS_PER_NORMALIZE {
            normalize(&mut self.limbs);
            self.pending = 0;
        }
    }

    /// The exact sum rounded to the nearest `f64` (ties to even). Totals at
    /// or beyond the overflow threshold round to `±inf`.
    pub fn value(&self) -> f64 {
        if let Some(special) = self.non_finite {
            return special;
        }

        let mut digits = self.limbs;
        normalize(&mut digits);

        let negative = digits[LIMBS - 1] < 0;
        if negative {
            for digit in digits.iter_mut() {
                *digit = -*digit;
            }
            normalize(&mut digits);
        }

        let magnitude = round_to_f64(&digits);
        if negative {
            -magnitude
        } else {
            magnitude
        }
    }

    fn absorb_non_finite(&mut self, value: f64) {
        self.non_finite = Some(match self.non_finite {
            Some(acc) => acc + value,
            None => value,
        });
    }
}

/// Split a finite, non-zero `value` into a signed integer mantissa and the
/// bit position of its least significant bit above `2^-1074`.
fn decompose(value: f64) -> (i64, u32) {
    let bits = value.to_bits();
    let biased_exponent = ((bits >> 52) & 0x7ff) as u32;
    let fraction = (bits & ((1 << 52) - 1)) as i64;

    let (magnitude, position) = if biased_exponent == 0 {
        (fraction, 0)
    } else {
        (fraction | (1 << 52), biased_exponent - 1)
    };

    if value.is_sign_negative() {
        (-magnitude, position)
    } else {
        (magnitude, position)
    }
}

/// Carry every limb into `[0, 2^32)` except the last, which keeps the sign.
fn normalize(limbs: &mut [i64; LIMBS]) {
    for i in 0..LIMBS - 1 {
        let carry = limbs[i] >> DIGIT_BITS;
        limbs[i] -= carry << DIGIT_BITS;
        limbs[i + 1] += carry;
    }
}

/// Round a normalized, non-negative digit array to the nearest `f64`.
fn round_to_f64(digits: &[i64; LIMBS]) -> f64 {
    let Some(top) = digits.iter().rposition(|&d| d != 0) else {
        return 0.0;
    };

    let digit = |i: usize| -> u128 { digits.get(i).map_or(0, |&d| d as u128) };
    let window = (digit(top) << 64)
        | (top.checked_sub(1).map_or(0, digit) << 32)
        | top.checked_sub(2).map_or(0, digit);
    let sticky = top >= 3 && digits[..top - 2].iter().any(|&d| d != 0);

    // Exponent of the window's least significant bit.
    let base = DIGIT_BITS as i32 * (top as i32 - 2) + LSB_EXPONENT;
    let width = 128 - window.leading_zeros() as i32;

    // Keep 53 significant bits, fewer once the result is subnormal.
    let drop = (width - 53).max(LSB_EXPONENT - base) as u32;
    let mut mantissa = window >> drop;
    let rest = window & ((1u128 << drop) - 1);
    let half = 1u128 << (drop - 1);
    if rest > half || (rest == half && (sticky || mantissa & 1 == 1)) {
        mantissa += 1;
    }

    scale_by_power_of_two(mantissa as f64, base + drop as i32)
}

/// `x * 2^exponent` for an integer `x <= 2^53` whose product is already on
/// the `f64` grid; overflow yields `inf`.
fn scale_by_power_of_two(mut x: f64, mut exponent: i32) -> f64 {
    fn pow2(k: i32) -> f64 {
        f64::from_bits(((k + 1023) as u64) << 52)
    }

    while exponent > 1023 {
        x *= pow2(1023);
        exponent -= 1023;
    }
    if exponent < -1022 {
        x *= pow2(-1022);
        exponent += 1022;
    }
    x * pow2(exponent)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
