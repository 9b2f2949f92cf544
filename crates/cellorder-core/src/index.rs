//! Base-36 fractional-index algebra.
//!
//! Indices are non-empty strings over `0123456789abcdefghijklmnopqrstuvwxyz`.
//! Ordering is ASCII-lexicographic, which coincides with binary collation, so
//! indices can be stored and compared as plain byte strings in any backing
//! store without a custom collation.

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::error::{AlgebraError, Result};

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Extension probability for [`between_with_jitter`].
pub const JITTER_PROBABILITY: f64 = 0.3;

/// Indices are never extended past this length by jitter.
pub const JITTER_MAX_LEN: usize = 10;

fn char_val(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'z' => Ok(c - b'a' + 10),
        other => Err(AlgebraError::InvalidCharacter(other as char)),
    }
}

fn val_char(v: u8) -> char {
    ALPHABET[v as usize] as char
}

fn validate(s: &str) -> Result<()> {
    for c in s.bytes() {
        char_val(c)?;
    }
    Ok(())
}

/// `isValid(s) ⟺ s.len≥1 ∧ ∀c∈s: c∈alphabet`.
pub fn is_valid(s: &str) -> bool {
    !s.is_empty() && validate(s).is_ok()
}

/// Requires strict `<` for every consecutive pair.
pub fn validate_order(indices: &[String]) -> bool {
    indices.windows(2).all(|w| w[0] < w[1])
}

/// A capability for injecting randomness into [`between_with_jitter`] and
/// [`generate`]. Kept as a trait object so tests can supply deterministic
/// sequences.
pub trait JitterSource {
    /// Uniform sample in `[0, 1)`.
    fn random(&mut self) -> f64;
    /// Uniform integer sample in `[0, max)`.
    fn random_int(&mut self, max: usize) -> usize;
}

/// The default jitter source, backed by a seedable PRNG.
pub struct RngJitter {
    rng: StdRng,
}

impl RngJitter {
    /// Seed from the OS entropy source.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seed deterministically, for reproducible tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl JitterSource for RngJitter {
    fn random(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn random_int(&mut self, max: usize) -> usize {
        self.rng.random_range(0..max)
    }
}

/// A jitter source that never extends an index, used wherever deterministic,
/// zero-jitter index generation is required (e.g.
/// [`crate::rebalance::needs_rebalancing`]).
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn random(&mut self) -> f64 {
        1.0
    }

    fn random_int(&mut self, _max: usize) -> usize {
        0
    }
}

/// Reborrow an `Option<&mut dyn JitterSource>` with a fresh, shorter
/// lifetime tied to `opt` itself rather than to the lifetime baked into
/// `opt`'s own type. `Option::as_deref_mut` can't do this on its own here:
/// its `Target` is fixed to the trait object's original (invariant-under-
/// `&mut`) lifetime, which forces that original lifetime to cover every
/// call site that uses the reborrow — even across an intervening function
/// call that only needs it briefly.
pub(crate) fn reborrow_jitter<'a>(
    opt: &'a mut Option<&mut dyn JitterSource>,
) -> Option<&'a mut dyn JitterSource> {
    match opt {
        Some(j) => Some(&mut **j),
        None => None,
    }
}

/// `before(b)`.
pub fn before(b: &str) -> Result<String> {
    validate(b)?;
    if b.is_empty() {
        return Ok("m".to_string());
    }
    let bytes = b.as_bytes();
    match bytes.iter().position(|&c| c != b'0') {
        None => Ok(format!("0{b}")),
        Some(i) => {
            let v = char_val(bytes[i])?;
            if i == 0 && v > 1 {
                Ok(val_char(v / 2).to_string())
            } else if v > 1 {
                Ok(format!("{}{}", &b[..i], val_char(v / 2)))
            } else {
                Ok(format!("{}0h", &b[..i]))
            }
        }
    }
}

/// `after(a)`.
pub fn after(a: &str) -> Result<String> {
    validate(a)?;
    if a.is_empty() {
        return Ok("m".to_string());
    }
    let bytes = a.as_bytes();
    match bytes.iter().rposition(|&c| c != b'z') {
        None => Ok(format!("{a}h")),
        Some(i) => {
            let v = char_val(bytes[i])?;
            if v < 34 {
                Ok(format!("{}{}", &a[..i], val_char(v + 1)))
            } else {
                Ok(format!("{a}h"))
            }
        }
    }
}

fn between_finite(a: &str, b: &str) -> Result<String> {
    let ab = a.as_bytes();
    let bb = b.as_bytes();
    let i = ab.iter().zip(bb.iter()).take_while(|(x, y)| x == y).count();

    if i == a.len() {
        // Case A: a is a prefix of b.
        let v = char_val(bb[i])?;
        if v > 1 {
            Ok(format!("{a}{}", val_char(v / 2)))
        } else if v == 1 {
            Ok(format!("{a}0"))
        } else {
            let rest = &bb[i..];
            let j = match rest.iter().position(|&c| c != b'0') {
                Some(rel) => i + rel,
                None => bb.len(),
            };
            if j == bb.len() {
                let z = bb.len() - i;
                if z > 1 {
                    Ok(format!("{a}{}", "0".repeat(z / 2)))
                } else {
                    Err(AlgebraError::EmptyInterval(a.to_string(), b.to_string()))
                }
            } else {
                let v_prime = char_val(bb[j])?;
                Ok(format!(
                    "{a}{}{}",
                    "0".repeat(j - i),
                    val_char(v_prime / 2)
                ))
            }
        }
    } else {
        // Case B: both a and b have a character at i.
        let av = char_val(ab[i])?;
        let bv = char_val(bb[i])?;
        if bv - av > 1 {
            Ok(format!("{}{}", &a[..i], val_char((av + bv) / 2)))
        } else if i < a.len() - 1 {
            let tail = after(&a[i + 1..])?;
            Ok(format!("{}{}", &a[..=i], tail))
        } else {
            Ok(format!("{}h", &a[..=i]))
        }
    }
}

/// `between(a, b)` with no randomness source.
pub fn between(a: Option<&str>, b: Option<&str>) -> Result<String> {
    if let Some(a) = a {
        validate(a)?;
    }
    if let Some(b) = b {
        validate(b)?;
    }
    match (a, b) {
        (None, None) => Ok("m".to_string()),
        (None, Some(b)) => before(b),
        (Some(a), None) => after(a),
        (Some(a), Some(b)) => {
            if a >= b {
                return Err(AlgebraError::InvalidRange(a.to_string(), b.to_string()));
            }
            between_finite(a, b)
        }
    }
}

/// `between(a, b)` with an injected jitter source. After computing the
/// baseline result, with probability [`JITTER_PROBABILITY`] and while the
/// result is shorter than [`JITTER_MAX_LEN`], tries extending it with one
/// random base-36 character and keeps the extension only if it still lies
/// strictly between the bounds.
pub fn between_with_jitter(
    a: Option<&str>,
    b: Option<&str>,
    jitter: &mut dyn JitterSource,
) -> Result<String> {
    let k = between(a, b)?;
    if jitter.random() < JITTER_PROBABILITY && k.len() < JITTER_MAX_LEN {
        let c = val_char(jitter.random_int(36) as u8);
        let extended = format!("{k}{c}");
        let above_lower = a.is_none_or(|a| a < extended.as_str());
        let below_upper = b.is_none_or(|b| extended.as_str() < b);
        if above_lower && below_upper {
            return Ok(extended);
        }
    }
    Ok(k)
}

/// Encode a non-negative integer in the same base-36 alphabet as indices,
/// least significant digit last, with no leading zeros (`0` encodes as `"0"`).
pub(crate) fn encode_base36(mut v: u64) -> String {
    if v == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while v > 0 {
        digits.push(val_char((v % 36) as u8));
        v /= 36;
    }
    digits.iter().rev().collect()
}

/// Produce `n` indices strictly in order between `a` and `b`.
pub fn generate(
    a: Option<&str>,
    b: Option<&str>,
    n: usize,
    mut jitter: Option<&mut dyn JitterSource>,
) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(n);
    let mut prev = a.map(|s| s.to_string());
    for _ in 0..n {
        let idx = match jitter.as_deref_mut() {
            Some(j) => between_with_jitter(prev.as_deref(), b, j)?,
            None => between(prev.as_deref(), b)?,
        };
        out.push(idx.clone());
        prev = Some(idx);
    }
    Ok(out)
}
