use alloc::vec::Vec;

use crate::*;

/// Presentation cue derived from a committed change.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Revealed { count: usize },
    Damaged { coords: Coord2, amount: u32 },
    Defeated { coords: Coord2 },
    LevelUp { from: u8, to: u8 },
    Won,
    Lost,
}

/// Compares the snapshot a click transaction started from with the one it committed.
///
/// Only call this with the pair from a committed attempt; a losing attempt must not produce cues.
pub fn diff_effects(before: &Room, after: &Room, target: Coord2) -> Vec<Effect> {
    let mut effects = Vec::new();

    if let Some(board) = after.board.as_ref() {
        let was_revealed = |coords: Coord2| {
            !before.first_click
                && before
                    .board
                    .as_ref()
                    .and_then(|b| b.get(coords))
                    .is_some_and(|cell| cell.is_revealed)
        };
        let count = board
            .iter()
            .filter(|&(coords, cell)| cell.is_revealed && !cell.is_monster && !was_revealed(coords))
            .count();
        if count > 0 {
            effects.push(Effect::Revealed { count });
        }

        let was_dead = before
            .board
            .as_ref()
            .and_then(|b| b.get(target))
            .is_some_and(|cell| cell.is_dead);
        if board.get(target).is_some_and(|cell| cell.is_dead) && !was_dead {
            effects.push(Effect::Defeated { coords: target });
        }
    }

    if after.party.hp < before.party.hp {
        effects.push(Effect::Damaged {
            coords: target,
            amount: before.party.hp - after.party.hp,
        });
    }
    if after.party.level > before.party.level {
        effects.push(Effect::LevelUp {
            from: before.party.level,
            to: after.party.level,
        });
    }
    if after.game_state != before.game_state {
        match after.game_state {
            GamePhase::Won => effects.push(Effect::Won),
            GamePhase::Lost => effects.push(Effect::Lost),
            _ => {}
        }
    }

    effects
}

/// Builds the shared combat cue for `effects`, if they contain any combat.
pub fn damage_event_for(effects: &[Effect], id: u64, timestamp: u64) -> Option<DamageEvent> {
    let damage = effects.iter().find_map(|effect| match *effect {
        Effect::Damaged { coords, amount } => Some((coords, amount)),
        _ => None,
    });
    let defeated = effects.iter().find_map(|effect| match *effect {
        Effect::Defeated { coords } => Some(coords),
        _ => None,
    });

    let (kind, (row, col), damage) = match (defeated, damage) {
        (Some(coords), damage) => (
            DamageEventKind::Defeat,
            coords,
            damage.map(|(_, amount)| amount),
        ),
        (None, Some((coords, amount))) => (DamageEventKind::Damage, coords, Some(amount)),
        (None, None) => return None,
    };

    Some(DamageEvent {
        id,
        kind,
        row,
        col,
        damage,
        timestamp,
    })
}
