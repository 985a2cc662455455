//! Scoped key/value stores shared with handlers and interceptors.
//!
//! The application owns one root [`Context`]. Every router owns a nested
//! context whose parent is linked to the root when the router is registered,
//! so values installed with [`Application::extend`](crate::Application::extend)
//! are visible from any router while router-local values shadow them.
//!
//! Lookups walk the chain explicitly: local entries first, then the parent,
//! then the parent's parent.
//!
//! ```rust
//! use std::sync::Arc;
//! use pigweb::Context;
//!
//! let root = Arc::new(Context::new());
//! root.insert("db", String::from("postgres://localhost/app"));
//!
//! let local = Context::nested(Some(Arc::clone(&root)));
//! assert_eq!(local.get::<String>("db").unwrap().as_str(), "postgres://localhost/app");
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use tracing::warn;

use crate::error::{PigError, Result};

/// A value stored in a context.
pub type ContextValue = Arc<dyn Any + Send + Sync>;

/// Key/value scope with optional parent fallback.
///
/// Entries live in a `DashMap` and the parent link in an `ArcSwapOption`, so
/// a context shared behind `Arc` can still be extended and read from many
/// server coroutines without an exclusive lock.
pub struct Context {
    entries: DashMap<String, ContextValue>,
    parent: ArcSwapOption<Context>,
}

impl Context {
    /// Root context with no parent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            parent: ArcSwapOption::new(None),
        }
    }

    /// Context that falls back to `parent` for keys it does not hold.
    #[must_use]
    pub fn nested(parent: Option<Arc<Context>>) -> Self {
        let ctx = Self::new();
        ctx.parent.store(parent);
        ctx
    }

    /// Rebind the parent scope. Passing `None` detaches the context.
    ///
    /// A parent whose own chain already leads back to `self` is refused, since
    /// lookups would never terminate.
    pub fn relate(&self, parent: Option<Arc<Context>>) {
        if let Some(candidate) = &parent {
            if candidate.chain_contains(self) {
                warn!("refusing to relate a context to one of its own descendants");
                return;
            }
        }
        self.parent.store(parent);
    }

    #[must_use]
    pub fn parent(&self) -> Option<Arc<Context>> {
        self.parent.load_full()
    }

    fn chain_contains(&self, target: &Context) -> bool {
        if std::ptr::eq(self, target) {
            return true;
        }
        let mut cursor = self.parent();
        while let Some(ctx) = cursor {
            if std::ptr::eq(Arc::as_ptr(&ctx), target) {
                return true;
            }
            cursor = ctx.parent();
        }
        false
    }

    /// Store a value under `key` in this scope, returning the previous local value.
    pub fn insert<T>(&self, key: impl Into<String>, value: T) -> Option<ContextValue>
    where
        T: Any + Send + Sync,
    {
        self.insert_value(key, Arc::new(value))
    }

    /// Store an already shared value.
    pub fn insert_value(&self, key: impl Into<String>, value: ContextValue) -> Option<ContextValue> {
        self.entries.insert(key.into(), value)
    }

    /// Remove a local entry. Parent scopes are never modified.
    pub fn remove(&self, key: &str) -> Option<ContextValue> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    /// Look `key` up locally, then through the parent chain.
    ///
    /// # Errors
    ///
    /// `PigError::AttributeNotFound` when no scope in the chain defines `key`.
    pub fn get_value(&self, key: &str) -> Result<ContextValue> {
        if let Some(entry) = self.entries.get(key) {
            return Ok(Arc::clone(entry.value()));
        }
        let mut cursor = self.parent();
        while let Some(ctx) = cursor {
            if let Some(entry) = ctx.entries.get(key) {
                return Ok(Arc::clone(entry.value()));
            }
            cursor = ctx.parent();
        }
        Err(PigError::AttributeNotFound {
            key: key.to_string(),
        })
    }

    /// Typed lookup.
    ///
    /// # Errors
    ///
    /// * `PigError::AttributeNotFound` when the key is not defined anywhere
    /// * `PigError::TypeMismatch` when the nearest definition is another type
    pub fn get<T>(&self, key: &str) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.get_value(key)?
            .downcast::<T>()
            .map_err(|_| PigError::TypeMismatch {
                key: key.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Whether `key` resolves anywhere in the chain.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get_value(key).is_ok()
    }

    #[must_use]
    pub fn contains_local(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys defined in this scope only.
    #[must_use]
    pub fn local_keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.local_keys();
        keys.sort();
        f.debug_struct("Context")
            .field("keys", &keys)
            .field("has_parent", &self.parent.load().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_lookup() {
        let ctx = Context::new();
        ctx.insert("answer", 42_i64);
        assert_eq!(*ctx.get::<i64>("answer").unwrap(), 42);
        assert!(ctx.contains_local("answer"));
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let ctx = Context::new();
        let err = ctx.get_value("ghost").unwrap_err();
        assert!(matches!(err, PigError::AttributeNotFound { ref key } if key == "ghost"));
    }

    #[test]
    fn test_parent_fallback_and_shadowing() {
        let root = Arc::new(Context::new());
        root.insert("db", "primary".to_string());
        root.insert("mode", "global".to_string());

        let local = Context::nested(Some(Arc::clone(&root)));
        local.insert("mode", "local".to_string());

        assert_eq!(local.get::<String>("db").unwrap().as_str(), "primary");
        assert_eq!(local.get::<String>("mode").unwrap().as_str(), "local");
        assert_eq!(root.get::<String>("mode").unwrap().as_str(), "global");
        assert!(!local.contains_local("db"));
        assert!(local.contains("db"));
    }

    #[test]
    fn test_parent_sees_late_extensions() {
        let root = Arc::new(Context::new());
        let local = Context::nested(None);
        local.relate(Some(Arc::clone(&root)));
        assert!(!local.contains("cache"));
        root.insert("cache", vec![1_u8, 2, 3]);
        assert_eq!(local.get::<Vec<u8>>("cache").unwrap().len(), 3);
    }

    #[test]
    fn test_three_level_chain() {
        let root = Arc::new(Context::new());
        root.insert("k", 1_u32);
        let mid = Arc::new(Context::nested(Some(Arc::clone(&root))));
        let leaf = Context::nested(Some(mid));
        assert_eq!(*leaf.get::<u32>("k").unwrap(), 1);
    }

    #[test]
    fn test_type_mismatch() {
        let ctx = Context::new();
        ctx.insert("n", 1_u8);
        let err = ctx.get::<String>("n").unwrap_err();
        assert!(matches!(err, PigError::TypeMismatch { .. }));
    }

    #[test]
    fn test_relate_refuses_cycles() {
        let root = Arc::new(Context::new());
        let child = Arc::new(Context::nested(Some(Arc::clone(&root))));
        root.relate(Some(Arc::clone(&child)));
        assert!(root.parent().is_none());
        assert!(matches!(
            root.get_value("x"),
            Err(PigError::AttributeNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_only_touches_local_scope() {
        let root = Arc::new(Context::new());
        root.insert("k", 1_u32);
        let local = Context::nested(Some(Arc::clone(&root)));
        assert!(local.remove("k").is_none());
        assert!(local.contains("k"));
    }
}
