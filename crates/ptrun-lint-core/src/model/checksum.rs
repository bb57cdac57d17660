use serde::{Deserialize, Serialize};

/// One `<hash> <file name>` line of a `checksums.txt` release asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    pub hash: String,
    pub name: String,
}

impl Checksum {
    pub fn new(hash: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
        }
    }

    /// Parses a checksum manifest. Lines that are not a hash followed by a
    /// name are dropped.
    pub fn parse_manifest(content: &str) -> Vec<Self> {
        content
            .lines()
            .filter_map(|line| {
                let (hash, name) = line.trim().split_once(char::is_whitespace)?;
                let name = name.trim_start().trim_start_matches('*');
                (!name.is_empty()).then(|| Self::new(hash, name))
            })
            .collect()
    }

    /// The hash matches (any hex case) and the name refers to `file_name`.
    pub fn matches(&self, hash: &str, file_name: &str) -> bool {
        self.hash.eq_ignore_ascii_case(hash)
            && self
                .name
                .to_lowercase()
                .contains(&file_name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sha256sum_style_lines() {
        let manifest = "C2D1C03203B7  Valid-0.87.0-x64.zip\r\n\
                        abcdef012345 *Valid-0.87.0-arm64.zip\n\
                        \n";

        let checksums = Checksum::parse_manifest(manifest);
        assert_eq!(
            checksums,
            vec![
                Checksum::new("C2D1C03203B7", "Valid-0.87.0-x64.zip"),
                Checksum::new("abcdef012345", "Valid-0.87.0-arm64.zip"),
            ]
        );
    }

    #[test]
    fn malformed_lines_are_dropped() {
        let checksums = Checksum::parse_manifest("lonelytoken\n   \nHASH name.zip");
        assert_eq!(checksums, vec![Checksum::new("HASH", "name.zip")]);
    }

    #[test]
    fn match_ignores_case_of_hash_and_name() {
        let checksum = Checksum::new("c2d1c0", "dist/Valid-0.87.0-X64.zip");
        assert!(checksum.matches("C2D1C0", "Valid-0.87.0-x64.zip"));
        assert!(!checksum.matches("C2D1C1", "Valid-0.87.0-x64.zip"));
        assert!(!checksum.matches("C2D1C0", "Valid-0.87.0-arm64.zip"));
    }
}
