use std::fmt;

use crate::TypeAndData;

/// BLAKE3-256 digest of a component's serialized `"{type}:{data}"` form.
///
/// Persisted alongside each row so unique-key lookups compare digests rather
/// than re-serializing payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Compute the content hash of a serialized component.
pub fn content_hash(type_and_data: &TypeAndData) -> ContentHash {
    let input = format!("{}:{}", type_and_data.type_tag, type_and_data.data);
    ContentHash(*blake3::hash(input.as_bytes()).as_bytes())
}
