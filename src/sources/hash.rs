// Hash computation utilities for downloaded artifacts

use sha2::{Digest, Sha256, Sha512};

/// Hash algorithm types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Get the algorithm prefix for formatted output
    pub fn prefix(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_lowercase().as_str() {
            "sha256" => Some(HashAlgorithm::Sha256),
            "sha512" => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }
}

/// Compute hash of data and return formatted string (e.g., "sha256:abc123...")
pub fn compute_hash(data: &[u8], algorithm: HashAlgorithm) -> String {
    let hash_hex = match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(data);
            hex::encode(hasher.finalize())
        }
        HashAlgorithm::Sha512 => {
            let mut hasher = Sha512::new();
            hasher.update(data);
            hex::encode(hasher.finalize())
        }
    };

    format!("{}:{}", algorithm.prefix(), hash_hex)
}

/// Format an existing hash with algorithm prefix
pub fn format_hash(hash: &str, algorithm: HashAlgorithm) -> String {
    format!("{}:{}", algorithm.prefix(), hash.to_ascii_lowercase())
}

/// Split "algorithm:hex" into its parts
pub fn parse_hash(formatted: &str) -> anyhow::Result<(HashAlgorithm, &str)> {
    let (prefix, hex) = formatted.split_once(':').ok_or_else(|| {
        anyhow::anyhow!("Malformed hash '{}', expected 'algorithm:hex'", formatted)
    })?;
    let algorithm = HashAlgorithm::from_prefix(prefix)
        .ok_or_else(|| anyhow::anyhow!("Unsupported hash algorithm: {}", prefix))?;
    Ok((algorithm, hex))
}

/// Verify data against an "algorithm:hex" checksum
pub fn verify(data: &[u8], expected: &str) -> anyhow::Result<()> {
    let (algorithm, hex) = parse_hash(expected)?;
    let computed = compute_hash(data, algorithm);
    let expected = format_hash(hex, algorithm);

    if computed != expected {
        anyhow::bail!("Hash mismatch: expected {}, got {}", expected, computed);
    }
    Ok(())
}
