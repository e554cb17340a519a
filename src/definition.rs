//! Persisted data model: the JSON shapes stored in `items.json` and
//! `blocks.json` and replayed into the registries on startup.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored item definition.
///
/// `components` is an ordered JSON bag of component name to value; it is
/// converted to an SNBT component string at registration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub components: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ItemDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        ItemDefinition {
            id: id.into(),
            texture: None,
            components: Map::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_texture(id: impl Into<String>, texture: impl Into<String>) -> Self {
        let mut def = ItemDefinition::new(id);
        def.texture = Some(texture.into());
        def
    }
}

/// A stored block definition. Blocks always get a companion item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(default)]
    pub properties: BlockProperties,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub components: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Custom drops when mined. Empty means the block drops itself.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drops: Vec<DropRule>,
}

impl BlockDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        BlockDefinition {
            id: id.into(),
            texture: None,
            properties: BlockProperties::default(),
            components: Map::new(),
            tags: Vec::new(),
            drops: Vec::new(),
        }
    }

    pub fn with_texture(id: impl Into<String>, texture: impl Into<String>) -> Self {
        let mut def = BlockDefinition::new(id);
        def.texture = Some(texture.into());
        def
    }
}

/// Physical block behaviour. Every field is optional; `None` means the host
/// engine default applies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardness: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resistance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_correct_tool: Option<bool>,
    /// Emitted light, clamped to 0..=15 when applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friction: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_factor: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jump_factor: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_occlusion: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_collision: Option<bool>,
}

impl BlockProperties {
    /// Light level clamped to the valid 0..=15 range.
    pub fn clamped_light_level(&self) -> Option<i32> {
        self.light_level.map(|l| l.clamp(0, 15))
    }

    /// Resolve the sound type string. Unknown or missing names fall back to
    /// stone rather than failing the whole definition.
    pub fn sound_kind(&self) -> SoundKind {
        self.sound_type
            .as_deref()
            .map(SoundKind::parse)
            .unwrap_or(SoundKind::Stone)
    }
}

/// Block interaction sound families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundKind {
    Wood,
    Gravel,
    Grass,
    Stone,
    Metal,
    Glass,
    Wool,
    Sand,
    Snow,
    Chain,
    Anvil,
    Slime,
    Honey,
    Coral,
    Bamboo,
    NetherWood,
    Netherite,
    AncientDebris,
    Bone,
    NetherOre,
    NetherBricks,
    NetherGoldOre,
    Deepslate,
    DeepslateBricks,
    DeepslateTiles,
    Copper,
    Amethyst,
    AmethystCluster,
}

impl SoundKind {
    /// Lenient name lookup; anything unrecognized maps to `Stone`.
    pub fn parse(name: &str) -> SoundKind {
        match name.to_ascii_lowercase().as_str() {
            "wood" => SoundKind::Wood,
            "gravel" => SoundKind::Gravel,
            "grass" => SoundKind::Grass,
            "metal" => SoundKind::Metal,
            "glass" => SoundKind::Glass,
            "wool" => SoundKind::Wool,
            "sand" => SoundKind::Sand,
            "snow" => SoundKind::Snow,
            "chain" => SoundKind::Chain,
            "anvil" => SoundKind::Anvil,
            "slime" => SoundKind::Slime,
            "honey" => SoundKind::Honey,
            "coral" => SoundKind::Coral,
            "bamboo" => SoundKind::Bamboo,
            "nether_wood" | "crimson" | "warped" => SoundKind::NetherWood,
            "netherite" => SoundKind::Netherite,
            "ancient_debris" => SoundKind::AncientDebris,
            "bone" => SoundKind::Bone,
            "nether_ore" => SoundKind::NetherOre,
            "nether_bricks" => SoundKind::NetherBricks,
            "nether_gold_ore" => SoundKind::NetherGoldOre,
            "deepslate" => SoundKind::Deepslate,
            "deepslate_bricks" => SoundKind::DeepslateBricks,
            "deepslate_tiles" => SoundKind::DeepslateTiles,
            "copper" => SoundKind::Copper,
            "amethyst" => SoundKind::Amethyst,
            "amethyst_cluster" => SoundKind::AmethystCluster,
            _ => SoundKind::Stone,
        }
    }
}

/// One drop entry in a block's drop list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropRule {
    /// Item identifier, bare or namespaced.
    pub item: String,
    /// Fixed count, used when no min/max range is active.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Range lower bound; the range is active only when both min and max
    /// are greater than zero.
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub max: u32,
    /// Probability in 0.0..=1.0 that this rule yields anything.
    #[serde(default = "default_chance")]
    pub chance: f32,
}

fn default_count() -> u32 {
    1
}

fn default_chance() -> f32 {
    1.0
}

impl DropRule {
    pub fn of(item: impl Into<String>) -> Self {
        DropRule {
            item: item.into(),
            count: 1,
            min: 0,
            max: 0,
            chance: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_rule_defaults() {
        let rule: DropRule = serde_json::from_str(r#"{"item":"minecraft:coal"}"#).unwrap();
        assert_eq!(rule.count, 1);
        assert_eq!(rule.min, 0);
        assert_eq!(rule.max, 0);
        assert_eq!(rule.chance, 1.0);
    }

    #[test]
    fn test_block_properties_snake_case_keys() {
        let props: BlockProperties = serde_json::from_str(
            r#"{"hardness":3.0,"requires_correct_tool":true,"light_level":22,"sound_type":"stone"}"#,
        )
        .unwrap();
        assert_eq!(props.hardness, Some(3.0));
        assert_eq!(props.requires_correct_tool, Some(true));
        assert_eq!(props.clamped_light_level(), Some(15));
        assert_eq!(props.sound_kind(), SoundKind::Stone);
    }

    #[test]
    fn test_unknown_sound_falls_back_to_stone() {
        assert_eq!(SoundKind::parse("kazoo"), SoundKind::Stone);
        assert_eq!(SoundKind::parse("CRIMSON"), SoundKind::NetherWood);
    }

    #[test]
    fn test_item_definition_roundtrip_preserves_component_order() {
        let json = r#"{"id":"golden_apple","texture":"golden_apple","components":{"custom_name":{"text":"x"},"max_stack_size":16,"rarity":"rare"}}"#;
        let def: ItemDefinition = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = def.components.keys().map(String::as_str).collect();
        assert_eq!(keys, ["custom_name", "max_stack_size", "rarity"]);
    }
}
