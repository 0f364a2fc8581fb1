//! Storage entity traits

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be used as storage keys
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    /// Returns the key in the string form used by every backend
    fn storage_key(&self) -> String;
}

/// Trait for types that can be stored
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// The key type for this entity
    type Key: StorageKey;

    /// Short entity name used in error messages ("role", "order", ...)
    const KIND: &'static str;

    /// Returns the entity's key
    fn key(&self) -> &Self::Key;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    struct Code(u32);

    impl StorageKey for Code {
        fn storage_key(&self) -> String {
            self.0.to_string()
        }
    }

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct Country {
        code: Code,
        name: String,
    }

    impl StorageEntity for Country {
        type Key = Code;
        const KIND: &'static str = "country";

        fn key(&self) -> &Self::Key {
            &self.code
        }
    }

    #[test]
    fn test_storage_key_string_form() {
        let country = Country {
            code: Code(57),
            name: "Colombia".to_string(),
        };
        assert_eq!(country.key().storage_key(), "57");
        assert_eq!(Country::KIND, "country");
    }
}
