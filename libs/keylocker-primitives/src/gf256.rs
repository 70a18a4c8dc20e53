//! GF(2^8) arithmetic for Shamir secret sharing, using AES's field
//! (reduction polynomial x^8 + x^4 + x^3 + x + 1, 0x11B).
//!
//! This is core, in-scope arithmetic per the system design (not an external
//! collaborator), so it is hand-rolled rather than pulled in as a crate.

const REDUCTION: u16 = 0x11B;

/// Addition (and subtraction, they coincide in GF(2^8)).
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Multiplication via carry-less long multiplication with reduction.
pub fn mul(a: u8, b: u8) -> u8 {
    let mut a = a as u16;
    let mut b = b as u16;
    let mut product: u16 = 0;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= REDUCTION;
        }
        b >>= 1;
    }
    (product & 0xFF) as u8
}

/// Multiplicative inverse. Panics on zero, which has no inverse; callers
/// must never evaluate a polynomial or interpolate at a zero x-coordinate.
pub fn inv(a: u8) -> u8 {
    assert!(a != 0, "zero has no multiplicative inverse in GF(2^8)");
    // GF(2^8)* has order 255, so a^254 = a^-1.
    let mut result: u8 = 1;
    let mut base = a;
    let mut exp: u8 = 254;
    while exp != 0 {
        if exp & 1 != 0 {
            result = mul(result, base);
        }
        base = mul(base, base);
        exp >>= 1;
    }
    result
}

/// A polynomial over GF(2^8), coefficients in ascending degree order:
/// `coeffs[0]` is the constant term.
pub struct Polynomial<'a> {
    pub coeffs: &'a [u8],
}

impl<'a> Polynomial<'a> {
    /// Evaluate the polynomial at `x` using Horner's method.
    pub fn eval(&self, x: u8) -> u8 {
        let mut result = 0u8;
        for &c in self.coeffs.iter().rev() {
            result = add(mul(result, x), c);
        }
        result
    }
}

/// Lagrange interpolation at x = 0, given `points` as `(x, y)` pairs with
/// distinct nonzero `x` coordinates. This is how a Shamir share set
/// reconstructs the secret byte shared at each polynomial's constant term.
pub fn interpolate_at_zero(points: &[(u8, u8)]) -> u8 {
    let mut result = 0u8;
    for (i, &(xi, yi)) in points.iter().enumerate() {
        let mut numerator = 1u8;
        let mut denominator = 1u8;
        for (j, &(xj, _)) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            // term for x = 0: (0 - xj) / (xi - xj) == xj / (xi ^ xj) in GF(2^8)
            numerator = mul(numerator, xj);
            denominator = mul(denominator, add(xi, xj));
        }
        let term = mul(yi, mul(numerator, inv(denominator)));
        result = add(result, term);
    }
    result
}
