//! Runtime registry mutation for Minecraft-style hosts: register items and
//! blocks after the registries have frozen, synthesize the client assets
//! they need, persist definitions across restarts, and script behavior
//! through an embedded JavaScript sandbox.

pub mod assets;
pub mod component;
pub mod content;
pub mod definition;
pub mod drops;
pub mod error;
pub mod identifier;
pub mod persistence;
pub mod registry;
#[cfg(feature = "scripting")]
pub mod scripting;
pub mod session;
pub mod world;

pub use assets::{AssetKind, PackKind, ResourceSynthesizer, VirtualAssetPack};
pub use component::{components_to_snbt, BracketParser, ComponentParser};
pub use content::{Block, Item, ItemStack};
pub use definition::{BlockDefinition, BlockProperties, DropRule, ItemDefinition, SoundKind};
pub use drops::HarvestContext;
pub use error::{AccretionError, Result};
pub use identifier::Identifier;
pub use persistence::DefinitionStore;
pub use registry::{FreezeGuard, Holder, MappedRegistry, Registrar};
pub use session::{NullReloader, ResourceReloader, Session};

/// The namespace this crate registers content under by default.
pub const NAMESPACE: &str = "accretion";
