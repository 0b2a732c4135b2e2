use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// SHA-256(x).
pub fn hash(data: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(data);
    digest.into()
}

/// SHA-256(SHA-256(x)) — the chain's canonical transaction hash.
pub fn dhash(data: &[u8]) -> [u8; 32] {
    hash(&hash(data))
}

/// RIPEMD-160(SHA-256(x)) — used to derive addresses from public keys.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(sha);
    ripe.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dhash_matches_known_vector() {
        let got = dhash(b"covid-19");
        assert_eq!(
            hex::encode(got),
            "0babbdf4d1c0a701d12aa79fe1564f81b2d29b6ab60d5a571e9c916f0796a009"
        );
    }

    #[test]
    fn sha256_matches_known_vector() {
        let got = hash(b"covid-19");
        assert_eq!(
            hex::encode(got),
            "88529c3ac8ebd2dcb21a432c4ea0190c8370850b73ef95a527d150d4d424bc62"
        );
    }

    #[test]
    fn hash160_is_twenty_bytes() {
        assert_eq!(hash160(b"anything").len(), 20);
    }
}
