//! Fingerprint / identifier generation (C1).
//!
//! Every identifier handed out by the bus, the ESMTP interceptor, or the AI
//! community client is built from the same primitive: a process-lifetime
//! unique string, not a cryptographic nonce. The alphanumeric-suffix shape
//! mirrors the teacher's `generate_random_client_id`.

use rand::Rng;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// `req_<unix-nanos>_<8 random lowercase alphanumerics>`, per §4.1.
pub fn request_id() -> String {
    format!("req_{}_{}", crate::util::time::now_unix_nanos(), random_suffix(8))
}

pub fn event_id() -> String {
    format!("evt_{}_{}", crate::util::time::now_unix_nanos(), random_suffix(8))
}

pub fn review_id() -> String {
    format!("rev_{}_{}", crate::util::time::now_unix_nanos(), random_suffix(8))
}

pub fn community_id() -> String {
    format!("com_{}_{}", crate::util::time::now_unix_nanos(), random_suffix(8))
}
