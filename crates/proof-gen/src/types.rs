//! Shared primitive types and serde helpers.

/// A 32-byte Merkle node, leaf value or root.
pub type Hash32 = [u8; 32];

/// Format a 32-byte hash as `0x`-prefixed hex.
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a `0x`-prefixed (or bare) hex string into exactly 32 bytes.
///
/// # Errors
/// Returns a description of the problem when the input is not valid hex or
/// does not decode to 32 bytes.
pub fn parse_hex32(s: &str) -> Result<Hash32, String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| format!("Invalid hex: {e}"))?;
    bytes
        .try_into()
        .map_err(|_| "Expected 32 bytes".to_string())
}

/// Serde for a single 32-byte hash as a hex string.
pub mod hex_bytes32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_hex(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_hex32(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde for `Vec<[u8; 32]>` as an ordered list of hex strings.
pub mod proof_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S>(data: &Vec<[u8; 32]>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let hex_strings: Vec<String> = data.iter().map(|h| super::to_hex(h)).collect();
        hex_strings.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<[u8; 32]>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_strings: Vec<String> = Vec::deserialize(deserializer)?;
        hex_strings
            .iter()
            .map(|s| super::parse_hex32(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
