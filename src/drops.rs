//! Drop resolution for registered blocks: evaluates a block's drop rules
//! against the harvesting context and a random source.

use crate::content::{Item, ItemStack};
use crate::definition::DropRule;
use crate::identifier::Identifier;
use rand::Rng;
use std::sync::Arc;
use tracing::warn;

/// How a block was harvested.
#[derive(Debug, Clone, Copy)]
pub struct HarvestContext {
    pub correct_tool: bool,
}

impl HarvestContext {
    pub fn with_correct_tool() -> Self {
        HarvestContext { correct_tool: true }
    }

    pub fn with_wrong_tool() -> Self {
        HarvestContext {
            correct_tool: false,
        }
    }
}

/// Outcome of resolving one drop rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drop {
    pub item: Identifier,
    pub count: u32,
}

/// Evaluate a block's drop rules.
///
/// A block that requires the correct tool and was harvested without it drops
/// nothing, regardless of its rules. Each rule then rolls its chance gate
/// before the count: failed rolls are skipped, and a min/max range (active
/// when both bounds are positive) overrides the fixed count with a uniform
/// pick, swapping inverted bounds. Rules naming an item the lookup cannot
/// resolve are skipped with a warning rather than failing the harvest.
pub fn resolve_drops<R, F>(
    block: &Identifier,
    rules: &[DropRule],
    requires_correct_tool: bool,
    harvest: HarvestContext,
    rng: &mut R,
    mut lookup: F,
) -> Vec<Drop>
where
    R: Rng + ?Sized,
    F: FnMut(&Identifier) -> Option<Arc<Item>>,
{
    if requires_correct_tool && !harvest.correct_tool {
        return Vec::new();
    }

    let mut out = Vec::new();
    for rule in rules {
        let item_id = match Identifier::parse(&rule.item, "minecraft") {
            Ok(id) => id,
            Err(_) => {
                warn!(block = %block, item = %rule.item, "invalid item id in drop rule");
                continue;
            }
        };
        if lookup(&item_id).is_none() {
            warn!(block = %block, item = %item_id, "drop rule names unknown item");
            continue;
        }

        if rule.chance < 1.0 && rng.gen::<f32>() > rule.chance {
            continue;
        }

        let count = if rule.min > 0 && rule.max > 0 {
            let lo = rule.min.min(rule.max);
            let hi = rule.min.max(rule.max);
            rng.gen_range(lo..=hi)
        } else {
            rule.count
        };

        out.push(Drop {
            item: item_id,
            count,
        });
    }
    out
}

/// Turn resolved drops into stacks. Items in `own_namespace` carry their
/// stored components; foreign items never do.
pub fn drops_to_stacks<F, C>(
    drops: &[Drop],
    own_namespace: &str,
    mut lookup: F,
    mut components_for: C,
) -> Vec<ItemStack>
where
    F: FnMut(&Identifier) -> Option<Arc<Item>>,
    C: FnMut(&str) -> Vec<(String, String)>,
{
    let mut stacks = Vec::new();
    for drop in drops {
        let Some(item) = lookup(&drop.item) else {
            continue;
        };
        let components = if drop.item.namespace() == own_namespace {
            components_for(drop.item.path())
        } else {
            Vec::new()
        };
        stacks.push(ItemStack::with_components(item, drop.count, components));
    }
    stacks
}
