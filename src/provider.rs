use std::fmt;
use std::sync::{Arc, RwLock};

/// Produces the ASCII-safe product name to write into the Xcode project
pub type ProductNameProvider = Arc<dyn Fn() -> String + Send + Sync>;

/// Shared, optional slot for a [`ProductNameProvider`].
///
/// Clones share the same slot, so configuration code can install a provider
/// after the hook has been handed to a registry. An empty slot means the hook
/// does nothing.
#[derive(Clone, Default)]
pub struct ProviderSlot {
    inner: Arc<RwLock<Option<ProductNameProvider>>>,
}

impl ProviderSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot that starts out holding `provider`
    pub fn with_provider<F>(provider: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        let slot = Self::new();
        slot.set(provider);
        slot
    }

    pub fn set<F>(&self, provider: F)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::new(provider));
    }

    pub fn clear(&self) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }

    /// Current provider. The lock is released before the caller invokes it.
    pub fn get(&self) -> Option<ProductNameProvider> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl fmt::Debug for ProviderSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSlot")
            .field("is_set", &self.is_set())
            .finish()
    }
}
