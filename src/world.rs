//! A simplified world model for the scripting layer. Scripts never touch
//! raw host objects; they see these explicit wrappers, which a host adapter
//! keeps in sync with the real world.

use crate::content::ItemStack;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3 { x, y, z }
    }
}

/// One applied status effect.
#[derive(Debug, Clone)]
pub struct EffectInstance {
    pub effect: String,
    pub duration_ticks: u32,
    pub amplifier: u32,
}

/// Which hand a held-item query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Main,
    Off,
}

impl Hand {
    /// Lenient name lookup, defaulting to the main hand.
    pub fn parse(name: &str) -> Hand {
        if name.eq_ignore_ascii_case("off_hand") {
            Hand::Off
        } else {
            Hand::Main
        }
    }
}

#[derive(Debug, Default)]
pub struct Player {
    pub name: String,
    pub position: Vec3,
    pub main_hand: Option<ItemStack>,
    pub off_hand: Option<ItemStack>,
    pub inventory: Vec<ItemStack>,
    pub effects: Vec<EffectInstance>,
    /// Chat messages delivered to this player, newest last.
    pub messages: Vec<String>,
}

impl Player {
    pub fn new(name: &str) -> Self {
        Player {
            name: name.to_string(),
            ..Player::default()
        }
    }

    pub fn held(&self, hand: Hand) -> Option<&ItemStack> {
        match hand {
            Hand::Main => self.main_hand.as_ref(),
            Hand::Off => self.off_hand.as_ref(),
        }
    }

    pub fn is_holding(&self, item_id: &str) -> bool {
        [Hand::Main, Hand::Off].iter().any(|&hand| {
            self.held(hand)
                .is_some_and(|stack| stack.item.id.to_string() == item_id || stack.item.id.path() == item_id)
        })
    }

    pub fn has_in_inventory(&self, item_id: &str) -> bool {
        self.inventory
            .iter()
            .chain(self.main_hand.iter())
            .chain(self.off_hand.iter())
            .any(|stack| stack.item.id.to_string() == item_id || stack.item.id.path() == item_id)
    }

    pub fn give(&mut self, stack: ItemStack) {
        self.inventory.push(stack);
    }
}

/// A recorded particle emission.
#[derive(Debug, Clone)]
pub struct ParticleEmission {
    pub particle: String,
    pub position: Vec3,
}

/// A recorded sound emission.
#[derive(Debug, Clone)]
pub struct SoundEmission {
    pub sound: String,
    pub position: Vec3,
    pub volume: f32,
    pub pitch: f32,
}

/// The world as the script API sees it: players plus the side effects
/// scripts have asked for, recorded so the host adapter (or a test) can
/// observe them.
#[derive(Debug, Default)]
pub struct World {
    pub players: Vec<Arc<Mutex<Player>>>,
    pub particles: Vec<ParticleEmission>,
    pub sounds: Vec<SoundEmission>,
}

impl World {
    pub fn new() -> Self {
        World::default()
    }

    pub fn add_player(&mut self, player: Player) -> Arc<Mutex<Player>> {
        let player = Arc::new(Mutex::new(player));
        self.players.push(player.clone());
        player
    }

    pub fn player(&self, name: &str) -> Option<Arc<Mutex<Player>>> {
        self.players
            .iter()
            .find(|p| {
                p.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .name
                    == name
            })
            .cloned()
    }
}
