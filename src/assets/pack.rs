//! The in-memory pack: a path-to-bytes map rebuilt from the synthesizer's
//! state, plus a static tier that survives rebuilds.

use super::synth::ResourceSynthesizer;
use crate::identifier::Identifier;
use std::collections::BTreeMap;
use tracing::{debug, info};

const PACK_FORMAT: u32 = 46;

/// Which resource tree a lookup targets. Only client assets are served;
/// server data requests always miss, matching a client-resource pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackKind {
    ClientAssets,
    ServerData,
}

/// A virtual resource pack. All content lives in memory; `rebuild` derives
/// the full resource map from a synthesizer, and statics added with
/// `add_static` persist across rebuilds.
pub struct VirtualAssetPack {
    pack_id: String,
    description: String,
    resources: BTreeMap<String, Vec<u8>>,
    statics: BTreeMap<String, Vec<u8>>,
}

impl VirtualAssetPack {
    pub fn new(namespace: &str, description: &str) -> Self {
        let pack_id = format!("{}_dynamic", namespace);
        info!(pack_id, "created virtual asset pack");
        VirtualAssetPack {
            pack_id,
            description: description.to_string(),
            resources: BTreeMap::new(),
            statics: BTreeMap::new(),
        }
    }

    pub fn pack_id(&self) -> &str {
        &self.pack_id
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn add_texture(&mut self, namespace: &str, path: &str, data: Vec<u8>) {
        let full = format!("assets/{}/textures/{}.png", namespace, path);
        debug!(path = %full, "added texture");
        self.resources.insert(full, data);
    }

    pub fn add_model(&mut self, namespace: &str, path: &str, json: &str) {
        let full = format!("assets/{}/models/{}.json", namespace, path);
        debug!(path = %full, "added model");
        self.resources.insert(full, json.as_bytes().to_vec());
    }

    pub fn add_item_definition(&mut self, namespace: &str, name: &str, json: &str) {
        let full = format!("assets/{}/items/{}.json", namespace, name);
        debug!(path = %full, "added item definition");
        self.resources.insert(full, json.as_bytes().to_vec());
    }

    pub fn add_blockstate(&mut self, namespace: &str, name: &str, json: &str) {
        let full = format!("assets/{}/blockstates/{}.json", namespace, name);
        debug!(path = %full, "added blockstate");
        self.resources.insert(full, json.as_bytes().to_vec());
    }

    /// Add a resource under its complete pack path. Statics survive
    /// rebuilds, which makes them the home for fixed UI textures.
    pub fn add_static(&mut self, full_path: &str, data: Vec<u8>) {
        self.statics.insert(full_path.to_string(), data.clone());
        self.resources.insert(full_path.to_string(), data);
    }

    /// Throw away the derived tier and rebuild it from the synthesizer.
    /// Document paths route three ways on their first segment: `items/` to
    /// the item-definition tree, `blockstates/` to the blockstate tree, and
    /// everything else to the model tree.
    pub fn rebuild(&mut self, synth: &ResourceSynthesizer) {
        self.resources.clear();
        for (path, data) in &self.statics {
            self.resources.insert(path.clone(), data.clone());
        }

        for (id, data) in synth.textures() {
            self.add_texture(id.namespace(), id.path(), data.clone());
        }
        for (id, json) in synth.documents() {
            let path = id.path();
            if let Some(name) = path.strip_prefix("items/") {
                self.add_item_definition(id.namespace(), name, json);
            } else if let Some(name) = path.strip_prefix("blockstates/") {
                self.add_blockstate(id.namespace(), name, json);
            } else {
                self.add_model(id.namespace(), path, json);
            }
        }
        info!(resources = self.resources.len(), statics = self.statics.len(), "rebuilt pack");
    }

    /// Look up a resource by identifier; the identifier's path already
    /// carries its tree prefix (`textures/...`, `models/...`).
    pub fn resource(&self, kind: PackKind, id: &Identifier) -> Option<&[u8]> {
        if kind != PackKind::ClientAssets {
            return None;
        }
        let full = format!("assets/{}/{}", id.namespace(), id.path());
        self.resources.get(&full).map(Vec::as_slice)
    }

    /// List resource paths under a namespace and path prefix. The prefix
    /// matches whole path segments, so `item` matches `item/ruby.png` but
    /// never `items/ruby.json`.
    pub fn list_resources(&self, kind: PackKind, namespace: &str, prefix: &str) -> Vec<String> {
        if kind != PackKind::ClientAssets {
            return Vec::new();
        }
        let base = format!("assets/{}/", namespace);
        self.resources
            .keys()
            .filter_map(|full| full.strip_prefix(&base))
            .filter(|path| {
                path.strip_prefix(prefix)
                    .is_some_and(|rest| prefix.is_empty() || rest.is_empty() || rest.starts_with('/'))
            })
            .map(str::to_string)
            .collect()
    }

    /// Namespaces present in the pack.
    pub fn namespaces(&self, kind: PackKind) -> Vec<String> {
        if kind != PackKind::ClientAssets {
            return Vec::new();
        }
        let mut out: Vec<String> = Vec::new();
        for full in self.resources.keys() {
            if let Some(rest) = full.strip_prefix("assets/") {
                if let Some((ns, _)) = rest.split_once('/') {
                    if out.last().map(String::as_str) != Some(ns) {
                        out.push(ns.to_string());
                    }
                }
            }
        }
        out.dedup();
        out
    }

    /// Root-level resources: only `pack.mcmeta` exists, synthesized on
    /// demand.
    pub fn root_resource(&self, name: &str) -> Option<Vec<u8>> {
        if name != "pack.mcmeta" {
            return None;
        }
        let meta = serde_json::json!({
            "pack": {
                "pack_format": PACK_FORMAT,
                "description": self.description
            }
        });
        serde_json::to_vec_pretty(&meta).ok()
    }
}
