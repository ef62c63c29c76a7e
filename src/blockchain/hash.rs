use std::fmt;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 digest identifying a block
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    /// Hashes the given bytes with SHA-256
    pub fn digest(bytes: &[u8]) -> Self {
        BlockHash(Sha256::digest(bytes).into())
    }

    /// The all-zero digest
    pub fn zero() -> Self {
        BlockHash([0u8; 32])
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        BlockHash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hexadecimal rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Number of leading `'0'` characters in the hexadecimal rendering
    pub fn leading_hex_zeros(&self) -> usize {
        let mut zeros = 0;
        for byte in self.0 {
            if byte == 0 {
                zeros += 2;
                continue;
            }
            if byte >> 4 == 0 {
                zeros += 1;
            }
            break;
        }
        zeros
    }

    /// Checks whether the first `difficulty` hex characters are all `'0'`
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.leading_hex_zeros() >= difficulty
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.to_hex())
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
