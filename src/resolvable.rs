//! A map whose values can be asked for before they exist

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::{Future, IntoFuture};
use std::hash::Hash;
use std::pin::Pin;

use tokio::sync::watch;


/// Returned when awaiting a value whose pending registration has been discarded
/// (see [`ResolvableMap::clear`] and [`ResolvableMap::remove`])
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unresolved;

impl Display for Unresolved {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "the value was discarded before being resolved")
    }
}

impl Error for Unresolved {}


/// A mapping from keys to values that may not be known yet.
///
/// [`get`](Self::get) never blocks: it returns a [`Lookup`] that is either ready, or that will complete
/// once someone [`resolve`](Self::resolve)s the key. Every `get` of the same unresolved key shares a single
/// pending registration.
#[derive(Debug)]
pub struct ResolvableMap<K, V> {
    resolved: HashMap<K, V>,
    pending: HashMap<K, watch::Sender<Option<V>>>,
}

impl<K, V> Default for ResolvableMap<K, V> {
    fn default() -> Self {
        Self { resolved: HashMap::new(), pending: HashMap::new() }
    }
}

impl<K, V> ResolvableMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, or a handle that completes once `key` is resolved
    pub fn get(&mut self, key: &K) -> Lookup<V> {
        if let Some(value) = self.resolved.get(key) {
            return Lookup { state: LookupState::Ready(value.clone()) };
        }

        let sender = self.pending
            .entry(key.clone())
            .or_insert_with(|| watch::channel(None).0);
        Lookup { state: LookupState::Pending(sender.subscribe()) }
    }

    /// Set the value of `key`, and complete the pending handles that were waiting for it (if any).
    ///
    /// A key nobody waited for is simply stored, and a key that already had a value is overwritten.
    /// Returns whether a pending registration has been completed.
    pub fn resolve(&mut self, key: K, value: V) -> bool {
        let was_pending = match self.pending.remove(&key) {
            None => false,
            Some(sender) => {
                // This only fails when every handle has been dropped already
                let _ = sender.send(Some(value.clone()));
                true
            },
        };
        self.resolved.insert(key, value);
        was_pending
    }

    /// Resolve every key that is still pending with `value`
    pub fn resolve_all(&mut self, value: V) {
        let keys: Vec<K> = self.pending.keys().cloned().collect();
        for key in keys {
            self.resolve(key, value.clone());
        }
    }

    /// Mutate a resolved value in place. Returns `None` (and does not call `f`) if `key` has no value yet.
    pub fn modify<T, F>(&mut self, key: &K, f: F) -> Option<T>
    where
        F: FnOnce(&mut V) -> T,
    {
        self.resolved.get_mut(key).map(f)
    }

    /// The value of `key`, if it has been resolved already
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.resolved.get(key)
    }

    /// Whether `key` has either a value, or a pending registration
    pub fn contains(&self, key: &K) -> bool {
        self.resolved.contains_key(key) || self.pending.contains_key(key)
    }

    /// Forget `key`. Handles still waiting for it will complete with [`Unresolved`]
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.pending.remove(key);
        self.resolved.remove(key)
    }

    /// Forget every value and every pending registration.
    /// Handles still waiting will complete with [`Unresolved`]
    pub fn clear(&mut self) {
        self.resolved.clear();
        self.pending.clear();
    }

    /// How many keys have a value
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    /// How many keys are awaited but have no value yet
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}


/// The result of [`ResolvableMap::get`]. Await it (or call [`wait`](Self::wait)) to get the value
#[derive(Debug)]
pub struct Lookup<V> {
    state: LookupState<V>,
}

#[derive(Debug)]
enum LookupState<V> {
    Ready(V),
    Pending(watch::Receiver<Option<V>>),
}

impl<V: Clone> Lookup<V> {
    /// Whether the value is available without waiting
    pub fn is_ready(&self) -> bool {
        match &self.state {
            LookupState::Ready(_) => true,
            LookupState::Pending(receiver) => receiver.borrow().is_some(),
        }
    }

    /// The value, if it is available without waiting
    pub fn try_value(&self) -> Option<V> {
        match &self.state {
            LookupState::Ready(value) => Some(value.clone()),
            LookupState::Pending(receiver) => receiver.borrow().clone(),
        }
    }

    /// Wait until the value is resolved
    pub async fn wait(self) -> Result<V, Unresolved> {
        let mut receiver = match self.state {
            LookupState::Ready(value) => return Ok(value),
            LookupState::Pending(receiver) => receiver,
        };

        loop {
            let current = receiver.borrow_and_update().clone();
            if let Some(value) = current {
                return Ok(value);
            }
            if receiver.changed().await.is_err() {
                // The registration is gone. It may still have been resolved right before that
                let last = receiver.borrow().clone();
                return last.ok_or(Unresolved);
            }
        }
    }
}

impl<V> IntoFuture for Lookup<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Output = Result<V, Unresolved>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolved_before_asked() {
        let mut map = ResolvableMap::new();
        assert_eq!(map.resolve("2022-05-01".to_string(), 12), false);

        let lookup = map.get(&"2022-05-01".to_string());
        assert!(lookup.is_ready());
        assert_eq!(lookup.await, Ok(12));
        assert_eq!(map.pending_count(), 0);
    }

    #[tokio::test]
    async fn asked_before_resolved() {
        let mut map = ResolvableMap::new();
        let first = map.get(&"k");
        let second = map.get(&"k");
        assert!(!first.is_ready());
        assert_eq!(first.try_value(), None);
        // Both lookups share one registration
        assert_eq!(map.pending_count(), 1);
        assert!(map.contains(&"k"));

        let waiter = tokio::spawn(first.wait());
        tokio::task::yield_now().await;

        assert!(map.resolve("k", vec![1, 2]));
        assert!(second.is_ready());
        assert_eq!(waiter.await.unwrap(), Ok(vec![1, 2]));
        assert_eq!(second.await, Ok(vec![1, 2]));

        // Later lookups no longer go through a registration
        assert_eq!(map.pending_count(), 0);
        assert_eq!(map.get(&"k").try_value(), Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn resolving_twice_overwrites() {
        let mut map = ResolvableMap::new();
        let lookup = map.get(&1);
        assert!(map.resolve(1, "first"));
        assert!(!map.resolve(1, "second"));

        assert_eq!(lookup.await, Ok("first"));
        assert_eq!(map.get(&1).await, Ok("second"));
    }

    #[tokio::test]
    async fn clear_discards_pending_handles() {
        let mut map: ResolvableMap<u32, String> = ResolvableMap::new();
        map.resolve(1, "one".to_string());
        let pending = map.get(&2);

        map.clear();
        assert_eq!(pending.await, Err(Unresolved));
        assert!(!map.contains(&1));
        assert_eq!(map.resolved_count(), 0);

        // The map is usable as usual afterwards
        let again = map.get(&2);
        map.resolve(2, "two".to_string());
        assert_eq!(again.await, Ok("two".to_string()));
    }

    #[tokio::test]
    async fn resolve_all_and_remove() {
        let mut map: ResolvableMap<&str, Vec<u8>> = ResolvableMap::new();
        let a = map.get(&"a");
        let b = map.get(&"b");
        let c = map.get(&"c");
        map.resolve("a", vec![1]);
        assert!(map.remove(&"c").is_none());

        map.resolve_all(Vec::new());
        assert_eq!(a.await, Ok(vec![1]));
        assert_eq!(b.await, Ok(Vec::new()));
        assert_eq!(c.await, Err(Unresolved));
        assert_eq!(map.pending_count(), 0);
    }

    #[test]
    fn modify_only_touches_resolved_values() {
        let mut map: ResolvableMap<&str, Vec<u8>> = ResolvableMap::new();
        let _pending = map.get(&"a");
        assert_eq!(map.modify(&"a", |v| v.push(1)), None);

        map.resolve("a", vec![1]);
        assert_eq!(map.modify(&"a", |v| { v.push(2); v.len() }), Some(2));
        assert_eq!(map.peek(&"a"), Some(&vec![1, 2]));
    }
}
