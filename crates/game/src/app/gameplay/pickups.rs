use engine::physics::{Rect, Vec2};
use engine::{EntityId, SpriteKind};

use super::weapons::WeaponKind;

pub(crate) const PICKUP_SIZE: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum PickupKind {
    Weapon(WeaponKind),
    Coin,
    InstaKill,
}

impl PickupKind {
    pub(crate) fn sprite_kind(self) -> SpriteKind {
        match self {
            PickupKind::Weapon(_) => SpriteKind::WeaponPickup,
            PickupKind::Coin => SpriteKind::Coin,
            PickupKind::InstaKill => SpriteKind::PowerUp,
        }
    }

    pub(crate) fn animation(self) -> &'static str {
        match self {
            PickupKind::Weapon(WeaponKind::Pistol) => "PISTOL",
            PickupKind::Weapon(WeaponKind::AssaultRifle) => "ASSAULT_RIFLE",
            PickupKind::Weapon(WeaponKind::Shotgun) => "SHOTGUN",
            PickupKind::Coin => "COIN",
            PickupKind::InstaKill => "INSTA_KILL",
        }
    }
}

/// Static collectible; consumed on first touch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Pickup {
    id: EntityId,
    kind: PickupKind,
    bounds: Rect,
}

impl Pickup {
    /// `anchor` is the bottom-center point the pickup rests on.
    pub(crate) fn resting_on(id: EntityId, kind: PickupKind, anchor: Vec2) -> Self {
        Self {
            id,
            kind,
            bounds: Rect::new(
                anchor.x - PICKUP_SIZE * 0.5,
                anchor.y - PICKUP_SIZE,
                PICKUP_SIZE,
                PICKUP_SIZE,
            ),
        }
    }

    pub(crate) fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn kind(&self) -> PickupKind {
        self.kind
    }

    pub(crate) fn bounds(&self) -> Rect {
        self.bounds
    }

    pub(crate) fn touches(&self, other: &Rect) -> bool {
        self.bounds.intersects(other)
    }
}
