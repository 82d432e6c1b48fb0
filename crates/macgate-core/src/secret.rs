// ── Pronounceable secret generator ──

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::CoreError;

pub const MIN_LENGTH: usize = 8;
pub const DEFAULT_LENGTH: usize = 20;

const VOWELS: &[u8] = b"aeiou";
const CONSONANTS: &[u8] = b"bcdfghjklmnpqrstvwxyz";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
pub const SPECIALS: &[u8] = b"!@#$%^&*()-_=+";

/// Generate a secret using the thread-local RNG.
pub fn generate(length: usize) -> Result<String, CoreError> {
    generate_with(&mut rand::rng(), length)
}

/// Generate a secret of `length` characters.
///
/// Consonant-vowel pairs fill most of it, with one uppercase letter, one
/// digit and one special character mixed in; any gap is padded with
/// lowercase letters before the whole sequence is shuffled.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Result<String, CoreError> {
    if length < MIN_LENGTH {
        return Err(CoreError::ValidationFailed {
            message: format!("secret length must be at least {MIN_LENGTH}, got {length}"),
        });
    }

    let mut chars = Vec::with_capacity(length);
    for _ in 0..(length - 4) / 2 {
        chars.push(pick(rng, CONSONANTS));
        chars.push(pick(rng, VOWELS));
    }
    chars.push(pick(rng, UPPERCASE));
    chars.push(pick(rng, DIGITS));
    chars.push(pick(rng, SPECIALS));
    while chars.len() < length {
        chars.push(pick(rng, LOWERCASE));
    }

    chars.shuffle(rng);
    Ok(chars.into_iter().collect())
}

fn pick<R: Rng + ?Sized>(rng: &mut R, set: &[u8]) -> char {
    char::from(set[rng.random_range(0..set.len())])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn default_length_meets_composition() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let secret = generate_with(&mut rng, DEFAULT_LENGTH).unwrap();
            assert_eq!(secret.chars().count(), 20);
            assert!(secret.chars().any(|c| c.is_ascii_uppercase()), "{secret}");
            assert!(secret.chars().any(|c| c.is_ascii_digit()), "{secret}");
            assert!(secret.bytes().any(|b| SPECIALS.contains(&b)), "{secret}");
        }
    }

    #[test]
    fn odd_and_minimum_lengths_are_exact() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(generate_with(&mut rng, 8).unwrap().len(), 8);
        assert_eq!(generate_with(&mut rng, 13).unwrap().len(), 13);
    }

    #[test]
    fn same_seed_same_secret() {
        let a = generate_with(&mut StdRng::seed_from_u64(42), 20).unwrap();
        let b = generate_with(&mut StdRng::seed_from_u64(42), 20).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn too_short_is_rejected() {
        assert!(matches!(generate(7), Err(CoreError::ValidationFailed { .. })));
    }
}
