//! Storage areas and the value helpers layered on top of them

use crate::{Result, StorageError};
use async_trait::async_trait;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use parking_lot::RwLock;
use serde_json::Value;
use std::io::{Read, Write};
use stylus_core::Object;

/// Key/value storage area holding JSON values
#[async_trait]
pub trait StorageArea: Send + Sync {
    /// Read the given keys; missing keys are absent from the result
    async fn get(&self, keys: &[&str]) -> Result<Object>;

    /// Read every stored key
    async fn get_all(&self) -> Result<Object>;

    /// Write all entries of `items`
    async fn set(&self, items: Object) -> Result<()>;

    /// Delete the given keys
    async fn remove(&self, keys: &[&str]) -> Result<()>;
}

/// In-memory storage area
#[derive(Debug, Default)]
pub struct MemoryArea {
    items: RwLock<Object>,
}

impl MemoryArea {
    /// Create an empty area
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Check whether the area is empty
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl StorageArea for MemoryArea {
    async fn get(&self, keys: &[&str]) -> Result<Object> {
        let items = self.items.read();
        Ok(keys
            .iter()
            .filter_map(|&key| items.get(key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn get_all(&self) -> Result<Object> {
        Ok(self.items.read().clone())
    }

    async fn set(&self, items: Object) -> Result<()> {
        let mut stored = self.items.write();
        for (key, value) in items {
            stored.insert(key, value);
        }
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut stored = self.items.write();
        for key in keys {
            stored.shift_remove(*key);
        }
        Ok(())
    }
}

/// Keys whose values are stored packed (large editor configs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackedKey {
    CssLint,
    StyleLint,
    UsercssTemplate,
}

impl PackedKey {
    /// All packed keys
    pub const ALL: [PackedKey; 3] = [Self::CssLint, Self::StyleLint, Self::UsercssTemplate];

    /// Storage key name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CssLint => "editorCSSLintConfig",
            Self::StyleLint => "editorStylelintConfig",
            Self::UsercssTemplate => "usercssTemplate",
        }
    }
}

/// Pack a value: JSON, deflate, hex
pub fn pack_value(value: &Value) -> Result<String> {
    let json = serde_json::to_vec(value)?;
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    Ok(hex::encode(encoder.finish()?))
}

/// Unpack a value produced by [`pack_value`]
pub fn unpack_value(packed: &str) -> Result<Value> {
    let bytes = hex::decode(packed).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    let mut json = Vec::new();
    DeflateDecoder::new(bytes.as_slice()).read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json)?)
}

/// Convenience accessors for any [`StorageArea`]
#[async_trait]
pub trait StorageExt: StorageArea {
    /// Read a single key
    async fn get_value(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.get(&[key]).await?.shift_remove(key))
    }

    /// Write a single key
    async fn set_value(&self, key: &str, value: Value) -> Result<()> {
        let mut items = Object::new();
        items.insert(key.to_string(), value);
        self.set(items).await
    }

    /// Read a packed key; unreadable data reads as `None`
    async fn get_packed_value(&self, key: &str) -> Result<Option<Value>> {
        let mut values = self.get_packed_values(&[key]).await?;
        Ok(values.shift_remove(key).filter(|v| !v.is_null()))
    }

    /// Read packed keys; missing or unreadable entries become `null`
    async fn get_packed_values(&self, keys: &[&str]) -> Result<Object> {
        let mut data = self.get(keys).await?;
        for &key in keys {
            let unpacked = match data.get(key).and_then(Value::as_str) {
                Some(packed) => unpack_value(packed).unwrap_or_else(|e| {
                    tracing::warn!(key, error = %e, "discarding unreadable packed value");
                    Value::Null
                }),
                None => Value::Null,
            };
            data.insert(key.to_string(), unpacked);
        }
        Ok(data)
    }

    /// Read all known packed keys
    async fn get_all_packed_values(&self) -> Result<Object> {
        let keys = PackedKey::ALL.map(PackedKey::as_str);
        self.get_packed_values(&keys).await
    }

    /// Pack and write a value
    async fn set_packed_value(&self, key: &str, value: &Value) -> Result<()> {
        let packed = pack_value(value)?;
        self.set_value(key, Value::String(packed)).await
    }
}

impl<S: StorageArea + ?Sized> StorageExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_area_get_set_remove() {
        let area = MemoryArea::new();
        area.set_value("a", json!(1)).await.unwrap();
        area.set_value("b", json!({"x": [1, 2]})).await.unwrap();

        let got = area.get(&["a", "missing"]).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got["a"], json!(1));

        assert_eq!(area.get_value("b").await.unwrap(), Some(json!({"x": [1, 2]})));
        assert_eq!(area.get_value("missing").await.unwrap(), None);

        area.remove(&["a"]).await.unwrap();
        assert_eq!(area.len(), 1);
        assert_eq!(area.get_all().await.unwrap().keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_memory_area_does_not_alias_values() {
        let area = MemoryArea::new();
        let mut value = json!({"list": [1]});
        area.set_value("k", value.clone()).await.unwrap();

        value["list"].as_array_mut().unwrap().push(json!(2));
        let mut read = area.get_value("k").await.unwrap().unwrap();
        read["list"] = json!([]);

        assert_eq!(area.get_value("k").await.unwrap(), Some(json!({"list": [1]})));
    }

    #[tokio::test]
    async fn test_packed_values() {
        let area = MemoryArea::new();
        let config = json!({"rules": {"color-no-invalid-hex": true}, "extends": []});
        let key = PackedKey::StyleLint.as_str();

        area.set_packed_value(key, &config).await.unwrap();

        let raw = area.get_value(key).await.unwrap().unwrap();
        assert!(raw.as_str().unwrap().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(area.get_packed_value(key).await.unwrap(), Some(config.clone()));

        let all = area.get_all_packed_values().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[key], config);
        assert_eq!(all[PackedKey::CssLint.as_str()], Value::Null);
    }

    #[tokio::test]
    async fn test_unreadable_packed_value_reads_as_none() {
        let area = MemoryArea::new();
        area.set_value("usercssTemplate", json!("zz-not-hex")).await.unwrap();

        assert_eq!(area.get_packed_value("usercssTemplate").await.unwrap(), None);
        assert!(unpack_value("zz").is_err());
    }
}
