//! Random identifier generation for public share links.

use rand::Rng;

/// Alphabet for public share identifiers.
/// Lowercase only and without look-alike characters (0, o, 1, l, i).
const SHARE_ID_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";

/// Length of a generated public share identifier.
pub const SHARE_ID_LENGTH: usize = 12;

/// Generates a random public share identifier.
///
/// The identifier is what guests see in the wishlist URL. It carries no
/// information about the internal account identifier.
pub fn generate_share_id() -> String {
    let mut rng = rand::thread_rng();
    (0..SHARE_ID_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..SHARE_ID_ALPHABET.len());
            SHARE_ID_ALPHABET[idx] as char
        })
        .collect()
}

/// Returns true if the value has the shape of a generated share identifier.
///
/// Used to reject obviously malformed path parameters before hitting the
/// database.
pub fn is_valid_share_id(value: &str) -> bool {
    (4..=64).contains(&value.len())
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
