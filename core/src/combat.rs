use alloc::string::String;
use serde::{Deserialize, Serialize};

use crate::*;

/// Combat stats shared by every player in a room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub hp: u32,
    pub max_hp: u32,
    pub level: u8,
    pub exp: u32,
}

impl Party {
    pub const fn new(hp: u32) -> Self {
        Self {
            hp,
            max_hp: hp,
            level: 1,
            exp: 0,
        }
    }

    pub const fn is_wiped(&self) -> bool {
        self.hp == 0
    }

    /// Subtracts `damage` from the shared HP, flooring at zero. Returns whether the party was wiped out.
    pub fn take_damage(&mut self, damage: u32) -> bool {
        self.hp = self.hp.saturating_sub(damage);
        self.is_wiped()
    }

    /// Adds experience and levels up as many times as the curve allows. Returns the number of levels gained.
    pub fn gain_exp(&mut self, amount: u32, curve: &LevelCurve, max_level: u8) -> u8 {
        self.exp = self.exp.saturating_add(amount);
        let start = self.level;
        while self.level < max_level {
            match curve.threshold(self.level) {
                Some(needed) if self.exp >= needed => self.level += 1,
                _ => break,
            }
        }
        self.level - start
    }

    /// Experience still missing for the next level, `None` at the cap.
    pub fn exp_to_next(&self, curve: &LevelCurve, max_level: u8) -> Option<u32> {
        if self.level >= max_level {
            return None;
        }
        curve
            .threshold(self.level)
            .map(|needed| needed.saturating_sub(self.exp))
    }
}

impl Default for Party {
    fn default() -> Self {
        Self::new(ModeConfig::default().hp)
    }
}

/// What a single attack did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttackReport {
    pub damage_taken: u32,
    pub defeated: bool,
    pub exp_gained: u32,
    pub levels_gained: u8,
    pub wiped: bool,
}

/// Resolves a click on a monster cell under the mode's combat policy.
///
/// Returns `None` when the cell holds nothing to fight: not a monster, already defeated, or (threshold policy) already
/// revealed.
pub fn resolve_attack(
    mode: &ModeConfig,
    party: &mut Party,
    cell: &mut Cell,
    attacker: &str,
) -> Option<AttackReport> {
    if !cell.is_live_monster() {
        return None;
    }
    if matches!(mode.combat, CombatPolicy::Threshold) && cell.is_revealed {
        return None;
    }

    cell.is_revealed = true;
    cell.revealed_by = Some(String::from(attacker));
    let monster_level = cell.monster_level;
    let mut report = AttackReport::default();

    let counter_attack = match mode.combat {
        CombatPolicy::HpPool => {
            cell.monster_hp -= i32::from(party.level);
            if cell.monster_hp <= 0 {
                defeat(cell);
                report.defeated = true;
                0
            } else {
                u32::from(monster_level)
            }
        }
        CombatPolicy::Threshold => {
            defeat(cell);
            report.defeated = true;
            u32::from(monster_level.saturating_sub(party.level))
        }
    };

    if report.defeated {
        report.exp_gained = mode.exp_reward.for_monster(monster_level);
        report.levels_gained = party.gain_exp(report.exp_gained, &mode.level_curve, mode.max_level());
    }
    if counter_attack > 0 {
        report.damage_taken = counter_attack;
        report.wiped = party.take_damage(counter_attack);
    }

    log::debug!(
        "{} attacked Lv{} monster: defeated={}, damage taken={}, exp+{}",
        attacker,
        monster_level,
        report.defeated,
        report.damage_taken,
        report.exp_gained
    );
    Some(report)
}

fn defeat(cell: &mut Cell) {
    cell.monster_hp = 0;
    cell.is_dead = true;
}
