//! Client-side entity identifiers: 20 random alphanumeric characters.

use uuid::Uuid;

pub const ID_LEN: usize = 20;
pub const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Allocates a fresh entity id.
///
/// 62^20 is below 2^128, so the 122 random bits of a v4 UUID are spread
/// across the 20 base-62 digits.
pub fn new_id() -> String {
    let mut bits = Uuid::new_v4().as_u128();
    let base = ID_ALPHABET.len() as u128;
    let mut id = String::with_capacity(ID_LEN);
    for _ in 0..ID_LEN {
        id.push(ID_ALPHABET[(bits % base) as usize] as char);
        bits /= base;
    }
    id
}
