use thiserror::Error;

/// Add this to an index to mark it as a hardened child derivation.
pub const HARDENED_FLAG: u32 = 0x8000_0000;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("fixed-width derivation path must be exactly 16 bytes, got {0}")]
    WrongByteLength(usize),
}

/// A derivation path: a sequence of BIP32 child indices. Index `0` is the
/// wildcard/terminator convention this chain relies on — both in textual
/// patterns ("*") and as the end-of-path marker in the fixed-width
/// encoding. A path carries at most four steps; the fixed-width wire
/// encoding is always exactly four big-endian `u32`s.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DerivationPath(pub Vec<u32>);

impl DerivationPath {
    pub fn steps(&self) -> &[u32] {
        &self.0
    }

    pub fn is_hardened_step(step: u32) -> bool {
        step >= HARDENED_FLAG
    }

    /// Parses the slash-separated textual form. A token is either `*`
    /// (wildcard, encoded as the step `0`) or a one- or two-character
    /// token whose first byte is the numeric index and whose optional
    /// second character marks the index hardened. Empty tokens (leading,
    /// trailing, or double slashes) are skipped.
    pub fn parse_text(path: &str) -> Self {
        let mut steps = Vec::new();
        for token in path.split('/') {
            if token.is_empty() {
                continue;
            }
            if token == "*" {
                steps.push(0);
                continue;
            }
            let bytes = token.as_bytes();
            let mut index = bytes[0] as u32;
            if bytes.len() == 2 {
                index += HARDENED_FLAG;
            }
            steps.push(index);
        }
        DerivationPath(steps)
    }

    /// Parses the 16-byte fixed-width form: four big-endian `u32`s, in
    /// order, with no special treatment of zero steps (the terminator
    /// convention is applied by derivation and predicate logic, not here).
    pub fn from_fixed_bytes(bytes: &[u8]) -> Result<Self, PathError> {
        if bytes.len() != 16 {
            return Err(PathError::WrongByteLength(bytes.len()));
        }
        let mut steps = Vec::with_capacity(4);
        for chunk in bytes.chunks_exact(4) {
            steps.push(u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        Ok(DerivationPath(steps))
    }

    /// Encodes to the 16-byte fixed-width form, zero-padding on the right
    /// when shorter than four steps and truncating to four when longer.
    pub fn to_fixed_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        for (i, step) in self.0.iter().take(4).enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&step.to_be_bytes());
        }
        out
    }

    pub fn to_text(&self) -> String {
        self.0
            .iter()
            .map(|&step| {
                if step == 0 {
                    "*".to_string()
                } else if Self::is_hardened_step(step) {
                    format!("{}{}", (step - HARDENED_FLAG) as u8 as char, '\u{1}')
                } else {
                    format!("{}", step as u8 as char)
                }
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// `is_path_under(exact, pattern)`: does the exact derivation path fall
/// within the pattern's scope? Walks `pattern`'s steps; a zero step
/// (wildcard) accepts immediately regardless of remaining exact depth. If
/// `exact` runs out of steps before a wildcard is reached, or the pattern
/// never hits a wildcard, the path is rejected — patterns here must
/// explicitly terminate with a wildcard to match anything.
pub fn is_path_under(exact: &DerivationPath, pattern: &DerivationPath) -> bool {
    for (i, &step) in pattern.0.iter().enumerate() {
        if exact.0.len() == i {
            return false;
        }
        if step != 0 {
            if exact.0[i] != step {
                return false;
            }
        } else {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wildcard_and_numeric_tokens() {
        let p = DerivationPath::parse_text("1/5/*");
        assert_eq!(p.0, vec![b'1' as u32, b'5' as u32, 0]);
    }

    #[test]
    fn skips_empty_tokens() {
        let p = DerivationPath::parse_text("/1//5/");
        assert_eq!(p.0, vec![b'1' as u32, b'5' as u32]);
    }

    #[test]
    fn hardened_token_sets_flag() {
        let p = DerivationPath::parse_text("1h");
        assert_eq!(p.0, vec![(b'1' as u32) + HARDENED_FLAG]);
    }

    #[test]
    fn fixed_width_round_trips() {
        let p = DerivationPath(vec![1, 2, 3, 4]);
        let bytes = p.to_fixed_bytes();
        let back = DerivationPath::from_fixed_bytes(&bytes).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn fixed_width_zero_pads_short_paths() {
        let p = DerivationPath(vec![7]);
        let bytes = p.to_fixed_bytes();
        assert_eq!(&bytes[4..], &[0u8; 12]);
    }

    #[test]
    fn path_under_matches_scenario_d() {
        let exact = DerivationPath::parse_text("1/5");
        let under_wildcard = DerivationPath::parse_text("1/*");
        let mismatched = DerivationPath::parse_text("2/*");
        assert!(is_path_under(&exact, &under_wildcard));
        assert!(!is_path_under(&exact, &mismatched));
    }

    #[test]
    fn path_under_requires_explicit_wildcard_terminator() {
        let exact = DerivationPath::parse_text("1/5");
        let same = DerivationPath::parse_text("1/5");
        assert!(!is_path_under(&exact, &same), "no wildcard means no match");
    }

    #[test]
    fn path_under_rejects_pattern_longer_than_exact() {
        let exact = DerivationPath::parse_text("1");
        let longer = DerivationPath::parse_text("1/5/*");
        assert!(!is_path_under(&exact, &longer));
    }
}
