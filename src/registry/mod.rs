//! Frozen-registry mutation: the backing registry model, the scoped
//! unfreeze/refreeze guard, and the registrar that drives registration.

mod freeze;
mod mapped;
mod registrar;

pub use freeze::FreezeGuard;
pub use mapped::{Holder, MappedRegistry};
pub use registrar::{Registrar, RegistrarStats};
