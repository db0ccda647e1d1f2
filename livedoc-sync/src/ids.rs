//! Random nonces and checkpoint identifiers, both lowercase base-36.

use chrono::Utc;
use rand::Rng;

use livedoc_core::CheckpointId;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of a write-stamp nonce.
pub const NONCE_LEN: usize = 11;

/// Fresh nonce for one publish call.
pub fn new_nonce() -> String {
    random_base36(NONCE_LEN)
}

/// `<base36 millis>_<6 random base36 chars>`, sortable by creation time.
pub fn new_checkpoint_id() -> CheckpointId {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    CheckpointId(format!("{}_{}", to_base36(millis), random_base36(6)))
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
