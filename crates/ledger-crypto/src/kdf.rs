use sha2::Sha256;

/// PBKDF2-HMAC-SHA256(password, salt, iterations) -> key_length bytes.
pub fn pbkdf2(password: &[u8], salt: &[u8], iterations: u32, key_length: usize) -> Vec<u8> {
    let mut out = vec![0u8; key_length];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
    out
}
