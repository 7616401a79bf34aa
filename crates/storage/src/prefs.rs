//! Preference store with change subscriptions
//!
//! Preferences are a fixed set of keys with default values. Setting a key
//! to a value structurally equal to the current one is a no-op and does
//! not notify subscribers.

use crate::area::{StorageArea, StorageExt};
use crate::{Result, StorageError};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use stylus_core::{deep_equal, Object};
use tracing::{debug, warn};

/// Storage key holding the non-default preference values
pub const PREFS_STORAGE_KEY: &str = "settings";

/// Listener invoked with `(key, new value)`
pub type PrefListener = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// Handle returned by [`Prefs::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    keys: Vec<String>,
    listener: PrefListener,
}

/// Preference store
pub struct Prefs {
    defaults: Object,
    values: RwLock<Object>,
    subscriptions: RwLock<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl Prefs {
    /// Create a store whose current values are the defaults
    pub fn new(defaults: Object) -> Self {
        Self {
            values: RwLock::new(defaults.clone()),
            defaults,
            subscriptions: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Check whether `key` is a known preference
    pub fn knows(&self, key: &str) -> bool {
        self.defaults.contains_key(key)
    }

    /// All known preference keys, in declaration order
    pub fn known_keys(&self) -> Vec<String> {
        self.defaults.keys().cloned().collect()
    }

    /// Default value of `key`
    pub fn default_value(&self, key: &str) -> Option<&Value> {
        self.defaults.get(key)
    }

    /// Current value of `key`
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    /// Current value of `key` as a string
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.values.read().get(key)?.as_str().map(str::to_string)
    }

    /// Current value of `key` as a bool; non-bools read as `false`
    pub fn get_bool(&self, key: &str) -> bool {
        self.values
            .read()
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Copy of all current values
    pub fn snapshot(&self) -> Object {
        self.values.read().clone()
    }

    /// Set `key` to `value`, notifying subscribers when it changed
    ///
    /// Returns whether the value changed.
    pub fn set(&self, key: &str, value: Value) -> Result<bool> {
        let default = self
            .defaults
            .get(key)
            .ok_or_else(|| StorageError::UnknownPref(key.to_string()))?;

        if !default.is_null() && kind_of(default) != kind_of(&value) {
            return Err(StorageError::TypeMismatch {
                key: key.to_string(),
                expected: kind_of(default),
                actual: kind_of(&value),
            });
        }

        {
            let mut values = self.values.write();
            if values.get(key).map_or(false, |old| deep_equal(old, &value, &[])) {
                return Ok(false);
            }
            values.insert(key.to_string(), value.clone());
        }

        debug!(key, "preference changed");
        self.notify(key, &value);
        Ok(true)
    }

    /// Restore the default value of `key`
    pub fn reset(&self, key: &str) -> Result<bool> {
        let default = self
            .defaults
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::UnknownPref(key.to_string()))?;
        self.set(key, default)
    }

    /// Subscribe to changes of `keys`
    ///
    /// With `run_now`, the listener is called immediately for each key
    /// with its current value.
    pub fn subscribe<F>(&self, keys: &[&str], listener: F, run_now: bool) -> SubscriptionId
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let listener: PrefListener = Arc::new(listener);

        self.subscriptions.write().push(Subscription {
            id,
            keys: keys.iter().map(|k| k.to_string()).collect(),
            listener: listener.clone(),
        });

        if run_now {
            for &key in keys {
                if let Some(value) = self.get(key) {
                    listener(key, &value);
                }
            }
        }
        id
    }

    /// Remove a subscription; unknown ids are ignored
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscriptions.write().retain(|s| s.id != id);
    }

    /// Apply stored values on top of the current ones
    ///
    /// Unknown keys and values of the wrong type are skipped. Returns the
    /// number of preferences that changed.
    pub async fn load(&self, area: &dyn StorageArea) -> Result<usize> {
        let stored = match area.get_value(PREFS_STORAGE_KEY).await? {
            Some(Value::Object(stored)) => stored,
            Some(other) => {
                warn!(kind = kind_of(&other), "ignoring malformed stored preferences");
                return Ok(0);
            }
            None => return Ok(0),
        };

        let mut changed = 0;
        for (key, value) in stored {
            match self.set(&key, value) {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(e) => warn!(key = %key, error = %e, "skipping stored preference"),
            }
        }
        Ok(changed)
    }

    /// Write the values that differ from their defaults
    pub async fn save(&self, area: &dyn StorageArea) -> Result<()> {
        let values = self.snapshot();
        let changed: Object = values
            .into_iter()
            .filter(|(key, value)| {
                self.defaults
                    .get(key)
                    .map_or(false, |default| !deep_equal(default, value, &[]))
            })
            .collect();
        area.set_value(PREFS_STORAGE_KEY, Value::Object(changed)).await
    }

    fn notify(&self, key: &str, value: &Value) {
        // Listeners run without the lock held so they may touch prefs
        let listeners: Vec<PrefListener> = self
            .subscriptions
            .read()
            .iter()
            .filter(|s| s.keys.iter().any(|k| k == key))
            .map(|s| s.listener.clone())
            .collect();

        for listener in listeners {
            listener(key, value);
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::MemoryArea;
    use parking_lot::Mutex;
    use serde_json::json;

    fn prefs() -> Prefs {
        let defaults = json!({
            "disableAll": false,
            "schemeSwitcher.enabled": "never",
            "popup.width": 246,
            "editor.keyMap": {"default": true},
        });
        Prefs::new(defaults.as_object().unwrap().clone())
    }

    #[test]
    fn test_get_and_set() {
        let prefs = prefs();
        assert_eq!(prefs.get("popup.width"), Some(json!(246)));
        assert!(!prefs.get_bool("disableAll"));

        assert!(prefs.set("disableAll", json!(true)).unwrap());
        assert!(prefs.get_bool("disableAll"));
        assert!(!prefs.set("disableAll", json!(true)).unwrap());
    }

    #[test]
    fn test_unknown_and_mistyped() {
        let prefs = prefs();
        assert!(matches!(
            prefs.set("nope", json!(1)),
            Err(StorageError::UnknownPref(k)) if k == "nope"
        ));
        assert!(matches!(
            prefs.set("popup.width", json!("wide")),
            Err(StorageError::TypeMismatch { expected: "number", actual: "string", .. })
        ));
    }

    #[test]
    fn test_subscribers_see_real_changes_only() {
        let prefs = prefs();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let id = prefs.subscribe(
            &["editor.keyMap", "disableAll"],
            move |key, value| sink.lock().push((key.to_string(), value.clone())),
            true,
        );
        assert_eq!(seen.lock().len(), 2);

        prefs.set("editor.keyMap", json!({"default": true})).unwrap();
        assert_eq!(seen.lock().len(), 2);

        prefs.set("editor.keyMap", json!({"default": false})).unwrap();
        prefs.set("popup.width", json!(300)).unwrap();
        assert_eq!(seen.lock().len(), 3);
        assert_eq!(seen.lock()[2], ("editor.keyMap".to_string(), json!({"default": false})));

        prefs.unsubscribe(id);
        prefs.reset("editor.keyMap").unwrap();
        assert_eq!(seen.lock().len(), 3);
        assert_eq!(prefs.get("editor.keyMap"), Some(json!({"default": true})));
    }

    #[test]
    fn test_listener_may_read_prefs() {
        let prefs = Arc::new(prefs());
        let inner = prefs.clone();
        let widths = Arc::new(Mutex::new(Vec::new()));
        let sink = widths.clone();

        prefs.subscribe(
            &["popup.width"],
            move |_, _| sink.lock().push(inner.get("popup.width")),
            false,
        );
        prefs.set("popup.width", json!(320)).unwrap();

        assert_eq!(*widths.lock(), vec![Some(json!(320))]);
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip_through_area() {
        let area = MemoryArea::new();
        let prefs = prefs();
        prefs.set("popup.width", json!(400)).unwrap();
        prefs.save(&area).await.unwrap();

        let stored = area.get_value(PREFS_STORAGE_KEY).await.unwrap().unwrap();
        assert_eq!(stored, json!({"popup.width": 400}));

        let mut raw = stored.as_object().unwrap().clone();
        raw.insert("removed.pref".to_string(), json!(1));
        raw.insert("disableAll".to_string(), json!("yes"));
        area.set_value(PREFS_STORAGE_KEY, Value::Object(raw)).await.unwrap();

        let fresh = self::prefs();
        assert_eq!(fresh.load(&area).await.unwrap(), 1);
        assert_eq!(fresh.get("popup.width"), Some(json!(400)));
        assert!(!fresh.get_bool("disableAll"));
    }
}
