//! Virtual assets: runtime synthesis of the client documents a registered
//! item or block needs, served through an in-memory pack.

mod pack;
mod synth;

pub use pack::{PackKind, VirtualAssetPack};
pub use synth::{AssetKind, ResourceSynthesizer};
