//! Generated identifiers for bulk-provisioned records.
//!
//! Classes and modules get a short random `code` and a slug-like `username`
//! derived from their display name. Neither is checked for uniqueness here;
//! callers insert with a conflict guard and draw a fresh value on collision.

use rand::Rng as _;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Default length of a generated code.
pub const CODE_LENGTH: usize = 8;

/// Length of the random suffix appended to generated usernames.
pub const USERNAME_SUFFIX_LENGTH: usize = 6;

fn random_string(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

/// Generates an uppercase code such as `K7QX2MPA`.
///
/// Ambiguous glyphs (`0`, `O`, `1`, `I`) are left out.
pub fn generate_code() -> String {
    random_string(CODE_ALPHABET, CODE_LENGTH)
}

/// Lowercases `name` and collapses every run of non-alphanumerics into `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut prev_dash = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            prev_dash = false;
        } else if !prev_dash && !slug.is_empty() {
            slug.push('-');
            prev_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Builds a username like `s4-pcm-2025-2026-x81kq0` from a display name.
pub fn generate_username(name: &str) -> String {
    let base = slugify(name);
    let suffix = random_string(SUFFIX_ALPHABET, USERNAME_SUFFIX_LENGTH);
    if base.is_empty() {
        suffix
    } else {
        format!("{}-{}", base, suffix)
    }
}

/// Where bulk provisioning draws its identifiers from.
pub trait IdentSource: Send + Sync {
    fn code(&self) -> String;
    fn username(&self, name: &str) -> String;
}

/// [`generate_code`] and [`generate_username`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdents;

impl IdentSource for RandomIdents {
    fn code(&self) -> String {
        generate_code()
    }

    fn username(&self, name: &str) -> String {
        generate_username(name)
    }
}
