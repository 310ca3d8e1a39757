use engine::app::AmmoGauge;
use tracing::{debug, info};

use super::archetypes::{WeaponSpec, WeaponTuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum WeaponKind {
    Pistol,
    AssaultRifle,
    Shotgun,
}

impl WeaponKind {
    #[cfg(test)]
    pub(crate) const ALL: [WeaponKind; 3] = [
        WeaponKind::Pistol,
        WeaponKind::AssaultRifle,
        WeaponKind::Shotgun,
    ];

    const fn index(self) -> usize {
        match self {
            WeaponKind::Pistol => 0,
            WeaponKind::AssaultRifle => 1,
            WeaponKind::Shotgun => 2,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            WeaponKind::Pistol => "pistol",
            WeaponKind::AssaultRifle => "assault_rifle",
            WeaponKind::Shotgun => "shotgun",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WeaponSlot {
    max_ammo: u32,
    ammo: u32,
    cooldown_delay: u32,
    /// Ticks since the last shot, saturating.
    cooldown_elapsed: u32,
    damage: u32,
    picked_up: bool,
}

impl WeaponSlot {
    fn new(spec: WeaponSpec) -> Self {
        Self {
            max_ammo: spec.max_ammo,
            ammo: spec.max_ammo,
            cooldown_delay: spec.cooldown_ticks,
            cooldown_elapsed: 0,
            damage: spec.damage,
            picked_up: false,
        }
    }

    fn cooled_down(&self) -> bool {
        self.cooldown_delay == 0 || self.cooldown_elapsed >= self.cooldown_delay
    }
}

/// A shot the level has to turn into a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ShotRequest {
    pub(crate) weapon: WeaponKind,
    pub(crate) damage: u32,
}

/// What the HUD shows for the active weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AmmoHud {
    pub(crate) weapon: WeaponKind,
    pub(crate) current: u32,
    pub(crate) max: u32,
    pub(crate) reloading: bool,
}

impl AmmoHud {
    pub(crate) fn gauge(&self) -> AmmoGauge {
        AmmoGauge {
            current: self.current,
            max: self.max,
        }
    }
}

/// Ammo pools, fire-rate cooldowns and the shared reload timer.
///
/// Only the most recently picked up weapon fires. Weapons without a cooldown
/// fire once per trigger press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WeaponController {
    slots: [WeaponSlot; 3],
    active: Option<WeaponKind>,
    trigger_armed: bool,
    reloading: bool,
    reload_elapsed: u32,
    reload_ticks: u32,
}

impl WeaponController {
    pub(crate) fn new(tuning: &WeaponTuning) -> Self {
        Self {
            slots: [
                WeaponSlot::new(tuning.pistol),
                WeaponSlot::new(tuning.assault_rifle),
                WeaponSlot::new(tuning.shotgun),
            ],
            active: None,
            trigger_armed: true,
            reloading: false,
            reload_elapsed: 0,
            reload_ticks: tuning.reload_ticks,
        }
    }

    #[cfg(test)]
    pub(crate) fn active(&self) -> Option<WeaponKind> {
        self.active
    }

    #[cfg(test)]
    pub(crate) fn is_picked_up(&self, weapon: WeaponKind) -> bool {
        self.slot(weapon).picked_up
    }

    pub(crate) fn ammo(&self, weapon: WeaponKind) -> u32 {
        self.slot(weapon).ammo
    }

    #[cfg(test)]
    pub(crate) fn max_ammo(&self, weapon: WeaponKind) -> u32 {
        self.slot(weapon).max_ammo
    }

    #[cfg(test)]
    pub(crate) fn is_reloading(&self) -> bool {
        self.reloading
    }

    #[cfg(test)]
    pub(crate) fn reload_elapsed(&self) -> u32 {
        self.reload_elapsed
    }

    pub(crate) fn hud(&self) -> Option<AmmoHud> {
        self.active.map(|weapon| {
            let slot = self.slot(weapon);
            AmmoHud {
                weapon,
                current: slot.ammo,
                max: slot.max_ammo,
                reloading: self.reloading,
            }
        })
    }

    /// Makes `weapon` the active one. Ammo carries over; a fresh pickup does
    /// not refill.
    pub(crate) fn pick_up(&mut self, weapon: WeaponKind) {
        self.slot_mut(weapon).picked_up = true;
        self.active = Some(weapon);
        info!(
            weapon = weapon.label(),
            ammo = self.ammo(weapon),
            "weapon_picked_up"
        );
    }

    /// Starts a reload unless one is running or nothing is held.
    pub(crate) fn start_reload(&mut self) -> bool {
        let Some(weapon) = self.active else {
            return false;
        };
        if self.reloading {
            return false;
        }
        self.reloading = true;
        self.reload_elapsed = 0;
        info!(weapon = weapon.label(), "reload_started");
        true
    }

    /// One tick of the weapon overlay. `reload_pressed` only starts a reload;
    /// the reload timer advances on the same tick it starts.
    pub(crate) fn update(&mut self, fire_down: bool, reload_pressed: bool) -> Option<ShotRequest> {
        if reload_pressed {
            self.start_reload();
        }

        let mut shot = None;
        if self.reloading {
            self.reload_elapsed = self.reload_elapsed.saturating_add(1);
            if self.reload_elapsed >= self.reload_ticks {
                self.finish_reload();
            }
        } else {
            for slot in &mut self.slots {
                slot.cooldown_elapsed = slot.cooldown_elapsed.saturating_add(1);
            }
            if fire_down && self.trigger_armed {
                shot = self.try_fire();
            }
        }

        if !fire_down {
            self.trigger_armed = true;
        }
        shot
    }

    /// Back to the state of a fresh level: nothing held, every pool full.
    pub(crate) fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.ammo = slot.max_ammo;
            slot.cooldown_elapsed = 0;
            slot.picked_up = false;
        }
        self.active = None;
        self.trigger_armed = true;
        self.reloading = false;
        self.reload_elapsed = 0;
    }

    fn try_fire(&mut self) -> Option<ShotRequest> {
        let weapon = self.active?;
        let slot = self.slot_mut(weapon);
        if !slot.picked_up || slot.ammo == 0 || !slot.cooled_down() {
            return None;
        }
        slot.ammo -= 1;
        slot.cooldown_elapsed = 0;
        let semi_automatic = slot.cooldown_delay == 0;
        let request = ShotRequest {
            weapon,
            damage: slot.damage,
        };
        let remaining = slot.ammo;
        if semi_automatic {
            self.trigger_armed = false;
        }
        debug!(weapon = weapon.label(), remaining, "weapon_fired");
        Some(request)
    }

    fn finish_reload(&mut self) {
        self.reloading = false;
        self.reload_elapsed = 0;
        if let Some(weapon) = self.active {
            let slot = self.slot_mut(weapon);
            slot.ammo = slot.max_ammo;
            info!(weapon = weapon.label(), ammo = slot.ammo, "reload_finished");
        }
    }

    fn slot(&self, weapon: WeaponKind) -> &WeaponSlot {
        &self.slots[weapon.index()]
    }

    fn slot_mut(&mut self, weapon: WeaponKind) -> &mut WeaponSlot {
        &mut self.slots[weapon.index()]
    }
}
