//! Method interception
//!
//! Collaborator methods that scenarios may stub are held in [`Slot`]s. The
//! [`InterceptionRegistry`] swaps a stub into a slot and keeps the original so
//! it can be put back; at most one interception per `(target, method)`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::error::{E2eError, E2eResult};

/// Process-unique identity of an interceptable object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId {
    id: u64,
    kind: &'static str,
}

impl TargetId {
    pub fn fresh(kind: &'static str) -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT.fetch_add(1, Ordering::Relaxed),
            kind,
        }
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// A rebindable method on a target
pub struct Slot<F: ?Sized> {
    target: TargetId,
    method: &'static str,
    initial: Arc<F>,
    current: RwLock<Arc<F>>,
}

impl<F: ?Sized> Slot<F> {
    pub fn new(target: TargetId, method: &'static str, implementation: Arc<F>) -> Self {
        Self {
            target,
            method,
            current: RwLock::new(implementation.clone()),
            initial: implementation,
        }
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    /// The implementation currently bound
    pub fn get(&self) -> Arc<F> {
        self.current.read().clone()
    }

    /// Whether something other than the construction-time implementation is bound
    pub fn is_replaced(&self) -> bool {
        !Arc::ptr_eq(&self.initial, &self.current.read())
    }

    fn swap(&self, implementation: Arc<F>) -> Arc<F> {
        std::mem::replace(&mut *self.current.write(), implementation)
    }
}

impl<F: ?Sized> fmt::Debug for Slot<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("target", &self.target)
            .field("method", &self.method)
            .field("replaced", &self.is_replaced())
            .finish()
    }
}

/// An active interception that can put its original back
trait Restore: Send {
    fn restore(self: Box<Self>);
}

struct Saved<F: ?Sized> {
    slot: Arc<Slot<F>>,
    original: Arc<F>,
}

impl<F: ?Sized + Send + Sync + 'static> Restore for Saved<F> {
    fn restore(self: Box<Self>) {
        self.slot.swap(self.original);
    }
}

type Key = (TargetId, &'static str);

/// Registry of active interceptions, owned by one run
#[derive(Default)]
pub struct InterceptionRegistry {
    active: Mutex<BTreeMap<Key, Box<dyn Restore>>>,
}

impl InterceptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `stub` into `slot`, remembering the original
    pub fn intercept<F>(&self, slot: &Arc<Slot<F>>, stub: Arc<F>) -> E2eResult<()>
    where
        F: ?Sized + Send + Sync + 'static,
    {
        let key = (slot.target, slot.method);
        let mut active = self.active.lock();
        if active.contains_key(&key) {
            return Err(E2eError::DuplicateInterception {
                target: slot.target.to_string(),
                method: slot.method.to_string(),
            });
        }

        let original = slot.swap(stub);
        active.insert(
            key,
            Box::new(Saved {
                slot: slot.clone(),
                original,
            }),
        );
        debug!("Intercepted {}/{}", slot.target, slot.method);
        Ok(())
    }

    /// Put the saved implementation back
    pub fn release(&self, target: TargetId, method: &str) -> E2eResult<()> {
        let saved = {
            let mut active = self.active.lock();
            let key = active
                .keys()
                .find(|(t, m)| *t == target && *m == method)
                .copied();
            key.and_then(|key| active.remove(&key))
        };

        match saved {
            Some(saved) => {
                saved.restore();
                debug!("Released {}/{}", target, method);
                Ok(())
            }
            None => Err(E2eError::UnknownInterception {
                target: target.to_string(),
                method: method.to_string(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }

    /// `target/method` for every active interception
    pub fn active(&self) -> Vec<String> {
        self.active
            .lock()
            .keys()
            .map(|(target, method)| format!("{}/{}", target, method))
            .collect()
    }

    /// Restore everything still intercepted; returns how many were restored
    pub fn release_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.active.lock());
        let count = drained.len();
        for saved in drained.into_values() {
            saved.restore();
        }
        count
    }
}

impl fmt::Debug for InterceptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptionRegistry")
            .field("active", &self.active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Greet = dyn Fn(&str) -> String + Send + Sync;

    fn stub(reply: &'static str) -> Arc<Greet> {
        Arc::new(move |_: &str| reply.to_string())
    }

    fn greeter() -> (TargetId, Arc<Slot<Greet>>, Arc<Greet>) {
        let target = TargetId::fresh("greeter");
        let original: Arc<Greet> = Arc::new(|name: &str| format!("hello {name}"));
        let slot = Arc::new(Slot::new(target, "greet", original.clone()));
        (target, slot, original)
    }

    #[test]
    fn test_round_trip_restores_identical_original() {
        let registry = InterceptionRegistry::new();
        let (target, slot, original) = greeter();

        registry.intercept(&slot, stub("stubbed")).unwrap();
        assert_eq!((slot.get())("x"), "stubbed");
        assert!(slot.is_replaced());

        registry.release(target, "greet").unwrap();
        assert!(Arc::ptr_eq(&slot.get(), &original));
        assert!(!slot.is_replaced());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_intercept_keeps_first() {
        let registry = InterceptionRegistry::new();
        let (target, slot, original) = greeter();

        registry.intercept(&slot, stub("first")).unwrap();
        let err = registry.intercept(&slot, stub("second")).unwrap_err();

        assert!(matches!(err, E2eError::DuplicateInterception { .. }));
        assert_eq!((slot.get())("x"), "first");

        registry.release(target, "greet").unwrap();
        assert!(Arc::ptr_eq(&slot.get(), &original));
    }

    #[test]
    fn test_release_without_intercept_fails() {
        let registry = InterceptionRegistry::new();
        let (target, slot, original) = greeter();

        let err = registry.release(target, "greet").unwrap_err();
        assert!(matches!(err, E2eError::UnknownInterception { .. }));
        assert!(Arc::ptr_eq(&slot.get(), &original));
    }

    #[test]
    fn test_same_method_on_distinct_targets() {
        let registry = InterceptionRegistry::new();
        let (a, slot_a, _) = greeter();
        let (_, slot_b, _) = greeter();

        registry.intercept(&slot_a, stub("a")).unwrap();
        registry.intercept(&slot_b, stub("b")).unwrap();
        assert_eq!(registry.active().len(), 2);

        registry.release(a, "greet").unwrap();
        assert_eq!((slot_a.get())("x"), "hello x");
        assert_eq!((slot_b.get())("x"), "b");
    }

    #[test]
    fn test_release_all_restores_everything() {
        let registry = InterceptionRegistry::new();
        let (_, slot, original) = greeter();

        registry.intercept(&slot, stub("leaked")).unwrap();
        assert_eq!(registry.release_all(), 1);
        assert!(registry.is_empty());
        assert!(Arc::ptr_eq(&slot.get(), &original));
    }
}
