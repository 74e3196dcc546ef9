//! Room invite code generation.
//!
//! Codes are 6 uniform characters from `A-Z0-9` (~31 bits), checked
//! against the live directory. Collisions are vanishingly rare at
//! realistic room counts, but the retry is bounded anyway: after
//! `MAX_ATTEMPTS` misses the generator falls back to 8-character codes
//! rather than looping unbounded.

use rand::Rng;

use raceline_protocol::RoomCode;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Standard code length.
pub(crate) const CODE_LEN: usize = 6;

/// Code length used after repeated collisions.
pub(crate) const FALLBACK_CODE_LEN: usize = 8;

/// Attempts at each length before giving up on it.
const MAX_ATTEMPTS: usize = 32;

/// Samples one uniformly random code of the given length.
fn random_code(len: usize) -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..len)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect();
    RoomCode::new(code)
}

/// Generates a code for which `is_taken` returns `false`.
///
/// Tries `MAX_ATTEMPTS` codes at [`CODE_LEN`], then again at
/// [`FALLBACK_CODE_LEN`]. The fallback space is ~2.8e12 codes, so
/// exhausting both rounds means the RNG is broken, not the directory full.
pub(crate) fn generate_code(
    is_taken: impl Fn(&RoomCode) -> bool,
) -> RoomCode {
    for len in [CODE_LEN, FALLBACK_CODE_LEN] {
        for _ in 0..MAX_ATTEMPTS {
            let code = random_code(len);
            if !is_taken(&code) {
                return code;
            }
        }
        tracing::warn!(
            len,
            attempts = MAX_ATTEMPTS,
            "room code collisions at this length, widening"
        );
    }
    // Last resort: accept a possible duplicate report from is_taken being
    // pathological and hand back a fresh long code.
    random_code(FALLBACK_CODE_LEN)
}
