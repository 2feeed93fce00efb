//! Idempotency-key derivation for order creation.

use sha2::{Digest, Sha256};

/// Compute the stable idempotency key for one logical charge attempt.
///
/// The key is a SHA-256 fingerprint of the rail, the appointment, the
/// rail-specific discriminator (card token, terminal id + mode, ...), the
/// amount at two decimals, and the attempt counter. Accidental double-submits
/// of the same attempt collapse into one gateway-side charge; a deliberate
/// retry bumps `attempt` and gets a fresh key.
pub fn idempotency_key(
    rail: &str,
    appointment_id: &str,
    discriminator: &str,
    amount: f64,
    attempt: u32,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(
        format!("{rail}:{appointment_id}:{discriminator}:{amount:.2}:{attempt}").as_bytes(),
    );
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}
