use std::collections::HashMap;
use std::hash::Hash;

/// Two-way map between natural keys (record names) and internal record ids.
///
/// Both directions are kept in sync by every mutating method, so a name resolves to at
/// most one id and an id to at most one name.
#[derive(Debug, Clone)]
pub struct BiMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    forward: HashMap<K, V>,
    reverse: HashMap<V, K>,
}

impl<K, V> Default for BiMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> BiMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            forward: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    /// Value bound to `key`, inserting `make()` first if the key is unknown.
    pub fn get_or_insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> V {
        if let Some(value) = self.forward.get(&key) {
            return value.clone();
        }
        let value = make();
        self.insert(key, value.clone());
        value
    }

    pub fn insert(&mut self, key: K, value: V) {
        if let Some(old) = self.forward.insert(key.clone(), value.clone()) {
            self.reverse.remove(&old);
        }
        self.reverse.insert(value, key);
    }

    pub fn get_by_key<Q>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.forward.get(key)
    }

    /// Drop the binding of `key`, returning its value.
    pub fn remove_by_key<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let value = self.forward.remove(key)?;
        self.reverse.remove(&value);
        Some(value)
    }

    /// Drop the binding of `value`, returning its key.
    pub fn remove_by_value(&mut self, value: &V) -> Option<K> {
        let key = self.reverse.remove(value)?;
        self.forward.remove(&key);
        Some(key)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod bimap_test {
    use super::*;

    #[test]
    fn test_both_directions() {
        let mut ids: BiMap<String, u32> = BiMap::new();
        assert!(ids.is_empty());

        let a = ids.get_or_insert_with("WASP-12".into(), || 1);
        let again = ids.get_or_insert_with("WASP-12".into(), || 99);
        assert_eq!(a, again);
        assert_eq!(ids.get_by_key("WASP-12"), Some(&1));
        assert_eq!(ids.len(), 1);

        assert_eq!(ids.remove_by_value(&1).as_deref(), Some("WASP-12"));
        assert!(ids.is_empty());
        assert_eq!(ids.remove_by_key("WASP-12"), None);
    }

    #[test]
    fn test_rebinding_drops_stale_reverse_entry() {
        let mut ids: BiMap<String, u32> = BiMap::new();
        ids.insert("HAT-P-7".into(), 1);
        ids.insert("HAT-P-7".into(), 2);
        assert_eq!(ids.remove_by_value(&1), None);
        assert_eq!(ids.get_by_key("HAT-P-7"), Some(&2));
        assert_eq!(ids.remove_by_key("HAT-P-7"), Some(2));
        assert!(ids.is_empty());
    }
}
