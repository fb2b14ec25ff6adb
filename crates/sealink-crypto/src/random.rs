//! OS-backed secure randomness.

/// Fill `buffer` from the OS CSPRNG.
///
/// # Panics
///
/// Panics if the OS RNG fails. Without working entropy no IV, client id or
/// key generated by this crate would be safe to use.
#[allow(clippy::expect_used)]
pub fn fill_random(buffer: &mut [u8]) {
    getrandom::fill(buffer)
        .expect("invariant: OS RNG failure is unrecoverable - cannot generate key material");
}

/// Return `len` bytes from the OS CSPRNG.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    fill_random(&mut bytes);
    bytes
}
