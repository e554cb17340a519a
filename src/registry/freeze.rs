//! Scoped unfreeze/refreeze. Mutation code never toggles the frozen flag by
//! hand; it acquires a guard, mutates through it, and the guard restores the
//! prior freeze state on drop, error paths included.

use super::mapped::MappedRegistry;
use std::ops::{Deref, DerefMut};
use tracing::{error, warn};

/// Unfreezes a registry for the guard's lifetime and re-freezes it on drop,
/// but only if it was frozen at acquisition. Boot-time registration runs on
/// registries that were never frozen, and those must stay unfrozen after the
/// guard is gone.
pub struct FreezeGuard<'a, T> {
    registry: &'a mut MappedRegistry<T>,
    was_frozen: bool,
}

impl<'a, T> FreezeGuard<'a, T> {
    pub fn acquire(registry: &'a mut MappedRegistry<T>) -> Self {
        let was_frozen = registry.is_frozen();
        registry.unfreeze();
        FreezeGuard {
            registry,
            was_frozen,
        }
    }

    pub fn was_frozen(&self) -> bool {
        self.was_frozen
    }
}

impl<T> Deref for FreezeGuard<'_, T> {
    type Target = MappedRegistry<T>;

    fn deref(&self) -> &Self::Target {
        self.registry
    }
}

impl<T> DerefMut for FreezeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.registry
    }
}

impl<T> Drop for FreezeGuard<'_, T> {
    fn drop(&mut self) {
        if !self.was_frozen {
            return;
        }
        // A failed registration can leave a staged holder unclaimed; it must
        // not block the re-freeze.
        let discarded = self.registry.discard_pending();
        if discarded > 0 {
            warn!(
                registry = %self.registry.key(),
                discarded,
                "discarded unclaimed intrusive holders before re-freeze"
            );
        }
        if let Err(e) = self.registry.freeze() {
            // Leaving a registry unfrozen is safer than panicking in drop.
            error!(registry = %self.registry.key(), error = %e, "failed to re-freeze registry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Identifier;
    use std::sync::Arc;

    fn registry() -> MappedRegistry<String> {
        MappedRegistry::new(Identifier::of("minecraft", "item").unwrap())
    }

    #[test]
    fn test_refreezes_a_frozen_registry() {
        let mut reg = registry();
        reg.freeze().unwrap();
        {
            let mut guard = FreezeGuard::acquire(&mut reg);
            assert!(guard.was_frozen());
            guard
                .register(
                    Identifier::of("accretion", "ruby").unwrap(),
                    Arc::new("ruby".into()),
                )
                .unwrap();
        }
        assert!(reg.is_frozen());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_leaves_an_unfrozen_registry_unfrozen() {
        let mut reg = registry();
        {
            let guard = FreezeGuard::acquire(&mut reg);
            assert!(!guard.was_frozen());
        }
        assert!(!reg.is_frozen());
    }

    #[test]
    fn test_discards_unclaimed_staging_on_drop() {
        let mut reg = registry();
        reg.freeze().unwrap();
        {
            let mut guard = FreezeGuard::acquire(&mut reg);
            guard.create_intrusive(Arc::new("orphan".into())).unwrap();
            // Registration never claims the holder; the guard drops here.
        }
        assert!(reg.is_frozen());
        assert_eq!(reg.pending_intrusive(), 0);
    }

    #[test]
    fn test_refreezes_on_early_return() {
        let mut reg = registry();
        reg.freeze().unwrap();
        let attempt = |reg: &mut MappedRegistry<String>| -> crate::error::Result<()> {
            let mut guard = FreezeGuard::acquire(reg);
            guard.register(
                Identifier::of("accretion", "ruby").unwrap(),
                Arc::new("ruby".into()),
            )?;
            // Duplicate, bails with the guard still live.
            guard.register(
                Identifier::of("accretion", "ruby").unwrap(),
                Arc::new("other".into()),
            )?;
            Ok(())
        };
        assert!(attempt(&mut reg).is_err());
        assert!(reg.is_frozen());
    }
}
