//! Random identities for simulated users

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Ambiguous glyphs (0/o, 1/l/i) are left out so ids survive being read
// aloud by operators.
const ID_CHARSET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789_-";
const PASSWORD_CHARSET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";

const FIRST_NAMES: &[&str] = &[
    "avery", "casey", "devon", "elliot", "frankie", "harper", "jordan", "kendall", "logan",
    "morgan", "noel", "parker", "quinn", "riley", "sawyer", "taylor",
];

const LAST_NAMES: &[&str] = &[
    "arber", "bellwood", "crane", "dunmore", "ellery", "fairweather", "greaves", "holloway",
    "iverson", "jessop", "kirkby", "langley", "merritt", "norwood", "ormond", "pembroke",
];

/// Generator for bank ids, passwords and display names
#[derive(Debug)]
pub struct IdGen {
    rng: Mutex<StdRng>,
}

impl IdGen {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    fn random_string(&self, charset: &[u8], min: usize, max: usize) -> String {
        let mut rng = self.rng.lock();
        let length = rng.gen_range(min..=max);
        (0..length)
            .map(|_| charset[rng.gen_range(0..charset.len())] as char)
            .collect()
    }

    pub fn bank_id(&self) -> String {
        self.random_string(ID_CHARSET, 6, 12)
    }

    pub fn password(&self) -> String {
        self.random_string(PASSWORD_CHARSET, 12, 16)
    }

    pub fn display_name(&self) -> String {
        let mut rng = self.rng.lock();
        let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
        let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];
        format!("{first} {last}")
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_stay_inside_the_charset_and_bounds() {
        let gen = IdGen::new();
        for _ in 0..50 {
            let id = gen.bank_id();
            assert!((6..=12).contains(&id.len()));
            assert!(id.bytes().all(|b| ID_CHARSET.contains(&b)));
        }
    }

    #[test]
    fn passwords_are_long_enough() {
        let gen = IdGen::new();
        for _ in 0..50 {
            let password = gen.password();
            assert!((12..=16).contains(&password.len()));
            assert!(password.bytes().all(|b| PASSWORD_CHARSET.contains(&b)));
        }
    }

    #[test]
    fn display_names_have_two_parts() {
        let gen = IdGen::new();
        let name = gen.display_name();
        assert_eq!(name.split_whitespace().count(), 2);
    }
}
