use std::sync::{Arc, Mutex};

use super::store::AppStore;

/// Shared, cloneable access to the [`AppStore`].
///
/// Closures run under the lock; never `.await` inside one.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Mutex<AppStore>>,
}

impl StoreHandle {
    pub fn new(store: AppStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&AppStore) -> R) -> R {
        let store = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&store)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut AppStore) -> R) -> R {
        let mut store = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut store)
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.read(|store| f.debug_tuple("StoreHandle").field(store).finish())
    }
}
