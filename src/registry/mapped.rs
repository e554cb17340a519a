//! An identity-keyed registry with a freeze flag and intrusive-holder
//! staging, mirroring the host engine's mapped registries closely enough
//! that mutation code written against this model transfers directly.

use crate::error::{AccretionError, Result};
use crate::identifier::Identifier;
use rustc_hash::FxHashMap;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::debug;

/// A registry slot. Holders are created either directly at registration or
/// ahead of it as intrusive placeholders that registration later claims.
///
/// Tag state is three-valued: unbound (queries fail), bound empty, or bound
/// non-empty. Binding an empty set is how "this entry has no tags" is said
/// out loud.
pub struct Holder<T> {
    value: Arc<T>,
    id: OnceLock<Identifier>,
    tags: RwLock<Option<Vec<Identifier>>>,
}

impl<T> Holder<T> {
    fn new(value: Arc<T>) -> Self {
        Holder {
            value,
            id: OnceLock::new(),
            tags: RwLock::new(None),
        }
    }

    pub fn value(&self) -> &Arc<T> {
        &self.value
    }

    /// The bound identifier. Intrusive holders have none until registration
    /// claims them.
    pub fn id(&self) -> Option<&Identifier> {
        self.id.get()
    }

    pub fn is_bound(&self) -> bool {
        self.id.get().is_some()
    }

    /// Bound tags, failing if `bind_tags` was never called for this holder.
    pub fn tags(&self) -> Result<Vec<Identifier>> {
        let guard = self
            .tags
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match guard.as_ref() {
            Some(tags) => Ok(tags.clone()),
            None => Err(AccretionError::TagsNotBound(
                self.id
                    .get()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "<unbound holder>".to_string()),
            )),
        }
    }

    pub fn has_tag(&self, tag: &Identifier) -> Result<bool> {
        Ok(self.tags()?.contains(tag))
    }

    fn bind_tags(&self, tags: Vec<Identifier>) {
        let mut guard = self
            .tags
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Some(tags);
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Holder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Holder")
            .field("id", &self.id.get())
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

fn value_key<T>(value: &Arc<T>) -> usize {
    Arc::as_ptr(value) as usize
}

/// Identity-keyed registry with forward and reverse maps, registration-order
/// enumeration, intrusive staging, and a freeze flag.
pub struct MappedRegistry<T> {
    key: Identifier,
    entries: Vec<Identifier>,
    by_id: FxHashMap<Identifier, Arc<Holder<T>>>,
    by_value: FxHashMap<usize, Identifier>,
    /// Staged intrusive holders awaiting registration, keyed by value
    /// identity. `None` while frozen.
    intrusive: Option<FxHashMap<usize, Arc<Holder<T>>>>,
    frozen: bool,
}

impl<T> MappedRegistry<T> {
    /// A new registry in boot state: unfrozen, with an empty staging map.
    pub fn new(key: Identifier) -> Self {
        MappedRegistry {
            key,
            entries: Vec::new(),
            by_id: FxHashMap::default(),
            by_value: FxHashMap::default(),
            intrusive: Some(FxHashMap::default()),
            frozen: false,
        }
    }

    pub fn key(&self) -> &Identifier {
        &self.key
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &Identifier> {
        self.entries.iter()
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &Identifier) -> Option<&Arc<Holder<T>>> {
        self.by_id.get(id)
    }

    pub fn get_value(&self, id: &Identifier) -> Option<Arc<T>> {
        self.by_id.get(id).map(|h| h.value.clone())
    }

    /// Reverse lookup by value identity.
    pub fn id_of(&self, value: &Arc<T>) -> Result<&Identifier> {
        self.by_value
            .get(&value_key(value))
            .ok_or(AccretionError::UnknownValue {
                registry: self.key.clone(),
            })
    }

    /// The holder for an already-registered value, by identity.
    pub fn wrap_as_reference(&self, value: &Arc<T>) -> Option<Arc<Holder<T>>> {
        self.by_value
            .get(&value_key(value))
            .and_then(|id| self.by_id.get(id))
            .cloned()
    }

    /// Number of staged intrusive holders not yet claimed by registration.
    pub fn pending_intrusive(&self) -> usize {
        self.intrusive.as_ref().map_or(0, FxHashMap::len)
    }

    /// Drop every staged intrusive holder registration never claimed,
    /// returning how many were discarded. Clears the staging blockade so a
    /// failed registration cannot keep the registry from re-freezing.
    pub fn discard_pending(&mut self) -> usize {
        match self.intrusive.as_mut() {
            Some(staging) => {
                let discarded = staging.len();
                staging.clear();
                discarded
            }
            None => 0,
        }
    }

    /// Stage an intrusive holder for `value`. Registration of the same value
    /// later claims it, binding its identifier in place, so references taken
    /// now stay valid after registration.
    pub fn create_intrusive(&mut self, value: Arc<T>) -> Result<Arc<Holder<T>>> {
        let staging = match self.intrusive.as_mut() {
            Some(s) if !self.frozen => s,
            _ => {
                return Err(AccretionError::RegistryFrozen {
                    registry: self.key.clone(),
                })
            }
        };
        let holder = staging
            .entry(value_key(&value))
            .or_insert_with(|| Arc::new(Holder::new(value)))
            .clone();
        Ok(holder)
    }

    /// Register `value` under `id`. Claims a staged intrusive holder for the
    /// same value if one exists, otherwise creates a fresh holder.
    pub fn register(&mut self, id: Identifier, value: Arc<T>) -> Result<Arc<Holder<T>>> {
        if self.frozen {
            return Err(AccretionError::RegistryFrozen {
                registry: self.key.clone(),
            });
        }
        if self.by_id.contains_key(&id) {
            return Err(AccretionError::DuplicateEntry {
                registry: self.key.clone(),
                id,
            });
        }

        let key = value_key(&value);
        let holder = match self.intrusive.as_mut().and_then(|s| s.remove(&key)) {
            Some(staged) => staged,
            None => Arc::new(Holder::new(value.clone())),
        };
        let _ = holder.id.set(id.clone());

        self.entries.push(id.clone());
        self.by_value.insert(key, id.clone());
        self.by_id.insert(id, holder.clone());
        Ok(holder)
    }

    /// Bind the tag set for a registered entry. An empty set is a valid
    /// binding and is required before any tag query succeeds.
    pub fn bind_tags(&self, id: &Identifier, tags: Vec<Identifier>) -> Result<()> {
        let holder = self.by_id.get(id).ok_or_else(|| AccretionError::UnknownEntry {
            registry: self.key.clone(),
            id: id.clone(),
        })?;
        holder.bind_tags(tags);
        Ok(())
    }

    /// Freeze the registry. Fails if intrusive holders are still staged;
    /// succeeding discards the staging map entirely.
    pub fn freeze(&mut self) -> Result<()> {
        if self.frozen {
            return Ok(());
        }
        let pending = self.pending_intrusive();
        if pending > 0 {
            return Err(AccretionError::UnregisteredIntrusiveHolders {
                registry: self.key.clone(),
                count: pending,
            });
        }
        self.intrusive = None;
        self.frozen = true;
        debug!(registry = %self.key, entries = self.entries.len(), "registry frozen");
        Ok(())
    }

    /// Unfreeze for mutation. Already-unfrozen registries are left alone;
    /// a frozen one gets a fresh, empty staging map, discarding anything a
    /// previous session staged and never registered.
    pub fn unfreeze(&mut self) {
        if !self.frozen {
            return;
        }
        self.frozen = false;
        self.intrusive = Some(FxHashMap::default());
        debug!(registry = %self.key, "registry unfrozen");
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for MappedRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegistry")
            .field("key", &self.key)
            .field("entries", &self.entries.len())
            .field("frozen", &self.frozen)
            .field("pending_intrusive", &self.pending_intrusive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> MappedRegistry<String> {
        MappedRegistry::new(Identifier::of("minecraft", "item").unwrap())
    }

    fn id(path: &str) -> Identifier {
        Identifier::of("accretion", path).unwrap()
    }

    #[test]
    fn test_register_and_lookup_both_directions() {
        let mut reg = registry();
        let value = Arc::new("ruby".to_string());
        reg.register(id("ruby"), value.clone()).unwrap();
        assert_eq!(reg.get_value(&id("ruby")).as_deref(), Some(&"ruby".to_string()));
        assert_eq!(reg.id_of(&value).unwrap(), &id("ruby"));
        let holder = reg.wrap_as_reference(&value).unwrap();
        assert_eq!(holder.id(), Some(&id("ruby")));
        // Identity, not equality: an identical but distinct Arc is unknown.
        assert!(reg.id_of(&Arc::new("ruby".to_string())).is_err());
        assert!(reg.wrap_as_reference(&Arc::new("ruby".to_string())).is_none());
    }

    #[test]
    fn test_register_while_frozen_fails() {
        let mut reg = registry();
        reg.freeze().unwrap();
        let err = reg.register(id("ruby"), Arc::new("ruby".into()));
        assert!(matches!(err, Err(AccretionError::RegistryFrozen { .. })));
    }

    #[test]
    fn test_duplicate_id_rejected_and_enumerated_once() {
        let mut reg = registry();
        reg.register(id("ruby"), Arc::new("ruby".into())).unwrap();
        let err = reg.register(id("ruby"), Arc::new("other".into()));
        assert!(matches!(err, Err(AccretionError::DuplicateEntry { .. })));
        assert_eq!(reg.ids().count(), 1);
    }

    #[test]
    fn test_intrusive_holder_claimed_by_registration() {
        let mut reg = registry();
        let value = Arc::new("ruby".to_string());
        let staged = reg.create_intrusive(value.clone()).unwrap();
        assert!(!staged.is_bound());
        assert_eq!(reg.pending_intrusive(), 1);

        let registered = reg.register(id("ruby"), value).unwrap();
        assert!(Arc::ptr_eq(&staged, &registered));
        assert_eq!(staged.id(), Some(&id("ruby")));
        assert_eq!(reg.pending_intrusive(), 0);
    }

    #[test]
    fn test_freeze_blocked_by_pending_intrusive() {
        let mut reg = registry();
        reg.create_intrusive(Arc::new("orphan".into())).unwrap();
        let err = reg.freeze();
        assert!(matches!(
            err,
            Err(AccretionError::UnregisteredIntrusiveHolders { count: 1, .. })
        ));
        assert!(!reg.is_frozen());
    }

    #[test]
    fn test_unfreeze_restores_staging() {
        let mut reg = registry();
        reg.freeze().unwrap();
        assert!(reg.create_intrusive(Arc::new("ruby".into())).is_err());
        reg.unfreeze();
        assert_eq!(reg.pending_intrusive(), 0);
        reg.create_intrusive(Arc::new("ruby".into())).unwrap();
        assert_eq!(reg.pending_intrusive(), 1);
    }

    #[test]
    fn test_unfreeze_when_already_unfrozen_is_noop() {
        let mut reg = registry();
        reg.create_intrusive(Arc::new("pending".into())).unwrap();
        reg.unfreeze();
        // Boot-state staging survives a redundant unfreeze.
        assert_eq!(reg.pending_intrusive(), 1);
    }

    #[test]
    fn test_tag_queries_require_binding() {
        let mut reg = registry();
        let holder = reg.register(id("ruby"), Arc::new("ruby".into())).unwrap();
        assert!(holder.tags().is_err());

        reg.bind_tags(&id("ruby"), Vec::new()).unwrap();
        assert_eq!(holder.tags().unwrap(), Vec::<Identifier>::new());

        let tag = Identifier::of("minecraft", "swords").unwrap();
        reg.bind_tags(&id("ruby"), vec![tag.clone()]).unwrap();
        assert!(holder.has_tag(&tag).unwrap());
    }
}
