//! Short human-shareable codes.

use rand::distributions::Uniform;
use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const REPORT_TAG_LEN: usize = 8;
pub const SESSION_CODE_LEN: usize = 6;

fn random_code(len: usize) -> String {
    let dist = Uniform::from(0..ALPHABET.len());
    rand::thread_rng()
        .sample_iter(dist)
        .take(len)
        .map(|idx| ALPHABET[idx] as char)
        .collect()
}

/// Tag printed after a chat ends and quoted in `/report <tag>`.
pub fn report_tag() -> String {
    random_code(REPORT_TAG_LEN)
}

/// Code shown to both sides of a new pair and used in logs.
pub fn session_code() -> String {
    random_code(SESSION_CODE_LEN)
}
