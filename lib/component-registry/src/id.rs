use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::RegistryError;

/// Opaque 128-bit identifier used for entities and components.
///
/// Compared by byte equality. Generated ids are UUIDv7, so they sort roughly
/// by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Id([u8; 16]);

impl Id {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Id(bytes)
    }

    /// Generate a new time-ordered identifier.
    pub fn generate() -> Self {
        Id(*Uuid::now_v7().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl From<Uuid> for Id {
    fn from(uuid: Uuid) -> Self {
        Id(*uuid.as_bytes())
    }
}

impl From<Id> for Uuid {
    fn from(id: Id) -> Self {
        Uuid::from_bytes(id.0)
    }
}

impl TryFrom<&[u8]> for Id {
    type Error = RegistryError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; 16] = bytes.try_into().map_err(|_| {
            RegistryError::StorageError(format!("Invalid identifier length: {}", bytes.len()))
        })?;
        Ok(Id(bytes))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_bytes(self.0).hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct_and_ordered() {
        let first = Id::generate();
        let second = Id::generate();
        assert_ne!(first, second);
        assert!(first < second);
    }

    #[test]
    fn converts_through_uuid() {
        let uuid = Uuid::now_v7();
        let id = Id::from(uuid);
        assert_eq!(Uuid::from(id), uuid);
        assert_eq!(id.to_string(), uuid.hyphenated().to_string());
    }

    #[test]
    fn rejects_wrong_length() {
        let short = [0u8; 15];
        assert!(matches!(
            Id::try_from(&short[..]),
            Err(RegistryError::StorageError(_))
        ));

        let exact = [7u8; 16];
        let id = Id::try_from(&exact[..]).unwrap();
        assert_eq!(id.as_bytes(), &exact);
    }
}
