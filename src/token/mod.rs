//! Short external form identifiers.

use rand::Rng;

/// URL-safe alphabet, 64 symbols.
const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Length of an external form identifier.
pub const FORM_ID_LEN: usize = 10;

/// Generate a new external form identifier.
///
/// Collisions are improbable but not impossible; uniqueness is enforced by
/// the `forms.form_id` constraint at insert time, and the caller retries
/// with a fresh identifier on violation.
pub fn new_form_id() -> String {
    let mut rng = rand::rng();
    (0..FORM_ID_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_has_fixed_length_and_alphabet() {
        for _ in 0..100 {
            let id = new_form_id();
            assert_eq!(id.len(), FORM_ID_LEN);
            assert!(id.bytes().all(|b| ALPHABET.contains(&b)), "{id}");
        }
    }

    #[test]
    fn independent_ids_differ() {
        let a = new_form_id();
        let b = new_form_id();
        // 64^10 values; equality here means a broken source.
        assert_ne!(a, b);
    }
}
