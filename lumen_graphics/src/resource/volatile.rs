/// Registry of resources that must be rebuilt across a context reset
///
/// Registration order is dependency order: a resource is registered after
/// everything it is built from. Loading walks the list forwards and
/// unloading walks it backwards.

use crate::engine_warn;

#[derive(Debug)]
pub struct VolatileRegistry<K> {
    entries: Vec<K>,
}

impl<K> Default for VolatileRegistry<K> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: Copy + PartialEq + std::fmt::Debug> VolatileRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: K) {
        if !self.entries.contains(&key) {
            self.entries.push(key);
        }
    }

    pub fn unregister(&mut self, key: K) {
        self.entries.retain(|k| *k != key);
    }

    /// Load every entry in registration order
    ///
    /// A failure does not stop the walk; the return value is false if any
    /// entry failed.
    pub fn load_all<E: std::fmt::Display>(&self, mut load: impl FnMut(K) -> Result<(), E>) -> bool {
        let mut success = true;
        for &key in &self.entries {
            if let Err(e) = load(key) {
                engine_warn!("lumen::VolatileRegistry", "Could not reload {:?}: {}", key, e);
                success = false;
            }
        }
        success
    }

    /// Unload every entry in reverse registration order
    pub fn unload_all(&self, mut unload: impl FnMut(K)) {
        for &key in self.entries.iter().rev() {
            unload(key);
        }
    }

    pub fn keys(&self) -> &[K] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "volatile_tests.rs"]
mod tests;
