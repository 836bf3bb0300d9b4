//! Base62 encoding for short codes
//!
//! Turns a random 64-bit value into the fixed-width identifier that becomes
//! the public short code. Pure encoding only: randomness is the caller's job.

/// The 62-symbol alphabet: digits, upper-case, lower-case.
const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Fixed width of every generated code.
///
/// 62^7 ≈ 3.5 * 10^12 addressable codes, which keeps the collision
/// probability of a random draw negligible at any realistic link count.
pub const CODE_WIDTH: usize = 7;

/// Encodes `value` as a base62 string of exactly [`CODE_WIDTH`] symbols,
/// left-padded with `'0'`.
///
/// Total and deterministic: every input maps to exactly one output and there
/// is no error path. Values larger than 62^7 - 1 simply wrap by keeping the
/// low-order digits, which is fine for random code generation.
pub fn encode(mut value: u64) -> String {
    let mut buf = [ALPHABET[0]; CODE_WIDTH];
    let mut pos = CODE_WIDTH;
    while value > 0 && pos > 0 {
        pos -= 1;
        buf[pos] = ALPHABET[(value % 62) as usize];
        value /= 62;
    }
    // Alphabet bytes are always valid UTF-8
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_zero_is_all_zero_symbols() {
        assert_eq!(encode(0), "0000000");
    }

    #[test]
    fn encode_is_fixed_width() {
        for value in [0, 1, 61, 62, 12345, u64::MAX] {
            assert_eq!(encode(value).len(), CODE_WIDTH);
        }
    }

    #[test]
    fn encode_uses_only_the_alphabet() {
        let code = encode(rand::random::<u64>());
        assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn encode_known_values() {
        assert_eq!(encode(1), "0000001");
        assert_eq!(encode(61), "000000z");
        assert_eq!(encode(62), "0000010");
        assert_eq!(encode(62 * 62), "0000100");
    }

    #[test]
    fn encode_is_deterministic() {
        assert_eq!(encode(987654321), encode(987654321));
    }
}
