//! Synthesizes the client-side documents a registered entry needs: models,
//! item definitions and blockstates, plus texture bytes loaded from a
//! user-editable directory tree.

use crate::error::Result;
use crate::identifier::Identifier;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const README: &str = "\
Virtual asset directory
=======================

Place resources in the following folders:

textures/item/   - Item textures (16x16 PNG files)
textures/block/  - Block textures (16x16 PNG files)
models/item/     - Item model JSON files
models/block/    - Block model JSON files

File naming:
- Use lowercase names with underscores (e.g. my_custom_item.png)
- The filename (without extension) becomes the resource id

Example:
- textures/item/ruby.png -> <namespace>:item/ruby
";

/// Which side of the item/block split an asset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Item,
    Block,
}

impl AssetKind {
    pub fn folder(self) -> &'static str {
        match self {
            AssetKind::Item => "item",
            AssetKind::Block => "block",
        }
    }
}

/// Loads textures and synthesizes asset documents. Holds the derived state
/// the pack rebuilds from: texture bytes keyed by `<ns>:<kind>/<name>` and
/// JSON documents keyed by their routing path.
pub struct ResourceSynthesizer {
    namespace: String,
    root: PathBuf,
    textures: BTreeMap<Identifier, Vec<u8>>,
    documents: BTreeMap<Identifier, String>,
}

impl ResourceSynthesizer {
    /// Create the synthesizer, laying out the directory tree under `root`
    /// and writing the README on first use.
    pub fn new(namespace: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in ["textures/item", "textures/block", "models/item", "models/block"] {
            fs::create_dir_all(root.join(dir))?;
        }
        let readme = root.join("README.txt");
        if !readme.exists() {
            fs::write(&readme, README)?;
        }
        info!(root = %root.display(), "asset directory ready");
        Ok(ResourceSynthesizer {
            namespace: namespace.to_string(),
            root,
            textures: BTreeMap::new(),
            documents: BTreeMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn texture_path(&self, kind: AssetKind, name: &str) -> PathBuf {
        self.root
            .join("textures")
            .join(kind.folder())
            .join(format!("{}.png", name))
    }

    fn doc_id(&self, path: String) -> Option<Identifier> {
        Identifier::of(&self.namespace, &path).ok()
    }

    /// Load one texture from disk into memory. Returns false (with a
    /// warning) if the file is missing; callers fall back to a stock
    /// texture reference in that case.
    pub fn load_texture(&mut self, kind: AssetKind, name: &str) -> bool {
        let Some(id) = self.doc_id(format!("{}/{}", kind.folder(), name)) else {
            warn!(name, "invalid texture name");
            return false;
        };
        let path = self.texture_path(kind, name);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(_) => {
                warn!(path = %path.display(), "texture file not found");
                return false;
            }
        };
        debug!(texture = %id, size = data.len(), "loaded texture");
        self.textures.insert(id, data);
        true
    }

    pub fn is_texture_loaded(&self, kind: AssetKind, name: &str) -> bool {
        Identifier::of(&self.namespace, &format!("{}/{}", kind.folder(), name))
            .map(|id| self.textures.contains_key(&id))
            .unwrap_or(false)
    }

    pub fn texture_file_exists(&self, kind: AssetKind, name: &str) -> bool {
        self.texture_path(kind, name).exists()
    }

    /// The texture reference an item model should use: the loaded texture if
    /// present, otherwise a stock diamond so the entry renders at all.
    fn item_texture_ref(&mut self, texture: &str) -> String {
        if self.load_or_check(AssetKind::Item, texture) {
            format!("{}:item/{}", self.namespace, texture)
        } else {
            warn!(texture, "item texture unavailable, using minecraft:item/diamond");
            "minecraft:item/diamond".to_string()
        }
    }

    fn block_texture_ref(&mut self, texture: &str) -> String {
        if self.load_or_check(AssetKind::Block, texture) {
            format!("{}:block/{}", self.namespace, texture)
        } else {
            warn!(texture, "block texture unavailable, using minecraft:block/stone");
            "minecraft:block/stone".to_string()
        }
    }

    fn load_or_check(&mut self, kind: AssetKind, name: &str) -> bool {
        self.is_texture_loaded(kind, name) || self.load_texture(kind, name)
    }

    /// Synthesize the two documents an item needs: its model and its item
    /// definition.
    pub fn synthesize_item(&mut self, item_name: &str, texture: &str) {
        let (Some(model_id), Some(def_id)) = (
            self.doc_id(format!("item/{}", item_name)),
            self.doc_id(format!("items/{}", item_name)),
        ) else {
            warn!(item = item_name, "invalid name, skipping asset synthesis");
            return;
        };
        let texture_ref = self.item_texture_ref(texture);

        let model = json!({
            "parent": "minecraft:item/generated",
            "textures": { "layer0": texture_ref }
        });
        self.documents.insert(model_id, pretty(&model));

        let item_def = json!({
            "model": {
                "type": "minecraft:model",
                "model": format!("{}:item/{}", self.namespace, item_name)
            }
        });
        self.documents.insert(def_id, pretty(&item_def));
        info!(item = item_name, texture_ref, "synthesized item assets");
    }

    /// Synthesize the four documents a block needs: block model, held-item
    /// model, blockstate definition, and item definition.
    pub fn synthesize_block(&mut self, block_name: &str, texture: &str) {
        let (Some(block_model_id), Some(item_model_id), Some(blockstate_id), Some(def_id)) = (
            self.doc_id(format!("block/{}", block_name)),
            self.doc_id(format!("item/{}", block_name)),
            self.doc_id(format!("blockstates/{}", block_name)),
            self.doc_id(format!("items/{}", block_name)),
        ) else {
            warn!(block = block_name, "invalid name, skipping asset synthesis");
            return;
        };
        let texture_ref = self.block_texture_ref(texture);

        let block_model = json!({
            "parent": "minecraft:block/cube_all",
            "textures": { "all": texture_ref }
        });
        self.documents.insert(block_model_id, pretty(&block_model));

        let item_model = json!({
            "parent": format!("{}:block/{}", self.namespace, block_name)
        });
        self.documents.insert(item_model_id, pretty(&item_model));

        let blockstate = json!({
            "variants": {
                "": { "model": format!("{}:block/{}", self.namespace, block_name) }
            }
        });
        self.documents.insert(blockstate_id, pretty(&blockstate));

        let item_def = json!({
            "model": {
                "type": "minecraft:model",
                "model": format!("{}:item/{}", self.namespace, block_name)
            }
        });
        self.documents.insert(def_id, pretty(&item_def));
        info!(block = block_name, texture_ref, "synthesized block assets");
    }

    /// Load every texture and model file present on disk. Returns the count
    /// of resources loaded.
    pub fn load_all(&mut self) -> Result<usize> {
        let mut count = 0;
        for kind in [AssetKind::Item, AssetKind::Block] {
            let dir = self.root.join("textures").join(kind.folder());
            for name in list_with_extension(&dir, "png")? {
                if self.load_texture(kind, &name) {
                    count += 1;
                }
            }
            let dir = self.root.join("models").join(kind.folder());
            for name in list_with_extension(&dir, "json")? {
                let Some(id) = self.doc_id(format!("{}/{}", kind.folder(), name)) else {
                    warn!(name, "invalid model name, skipping");
                    continue;
                };
                let json = fs::read_to_string(dir.join(format!("{}.json", name)))?;
                self.documents.insert(id, json);
                count += 1;
            }
        }
        info!(count, "bulk-loaded assets from disk");
        Ok(count)
    }

    pub fn textures(&self) -> &BTreeMap<Identifier, Vec<u8>> {
        &self.textures
    }

    pub fn documents(&self) -> &BTreeMap<Identifier, String> {
        &self.documents
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn list_with_extension(dir: &Path, ext: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    if !dir.exists() {
        return Ok(names);
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some(ext) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
