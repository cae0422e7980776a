use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::*;

/// Highest monster level a mode may declare; marks are typed as single digits.
pub const MAX_SUPPORTED_LEVEL: u8 = 9;

/// Largest board side a mode may declare.
pub const MAX_BOARD_SIDE: Coord = 64;

/// Identifier of a game mode, stored in the room document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModeId {
    Easy,
    Normal,
    Extreme,
    Huge,
    HugeExtreme,
}

impl ModeId {
    pub const ALL: [ModeId; 5] = [
        Self::Easy,
        Self::Normal,
        Self::Extreme,
        Self::Huge,
        Self::HugeExtreme,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Extreme => "extreme",
            Self::Huge => "huge",
            Self::HugeExtreme => "hugeExtreme",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
    }

    /// Built-in configuration for this mode.
    pub fn preset(self) -> ModeConfig {
        match self {
            Self::Easy => ModeConfig::preset(16, 16, 10, &[10, 8, 6, 4, 2], &[0, 7, 20, 50, 82, 999]),
            Self::Normal => ModeConfig::preset(
                16,
                30,
                10,
                &[33, 27, 20, 13, 6],
                &[0, 10, 50, 167, 271, 999],
            ),
            Self::Extreme => ModeConfig::preset(
                16,
                30,
                10,
                &[25, 25, 25, 25, 25],
                &[0, 10, 50, 167, 271, 999],
            ),
            Self::Huge => ModeConfig::preset(
                25,
                50,
                30,
                &[50, 46, 39, 36, 29, 24, 18, 13, 1],
                &[0, 10, 90, 250, 500, 850, 1300, 1850, 2500, 9999],
            ),
            Self::HugeExtreme => ModeConfig::preset(
                25,
                50,
                10,
                &[36, 36, 36, 36, 36, 36, 36, 36, 36],
                &[0, 3, 10, 150, 400, 750, 1200, 1750, 2400, 9999],
            ),
        }
    }
}

impl Default for ModeId {
    fn default() -> Self {
        Self::Normal
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the experience needed for the next level is computed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelCurve {
    /// `table[level]` is the accumulated experience needed to leave `level`.
    Table(Vec<u32>),
    /// Leaving `level` needs `2^(level-1)` accumulated experience.
    PowerOfTwo,
}

impl LevelCurve {
    /// Accumulated experience needed to advance from `level`, `None` when there is no next level.
    pub fn threshold(&self, level: u8) -> Option<u32> {
        match self {
            Self::Table(table) => table.get(usize::from(level)).copied(),
            Self::PowerOfTwo => 1u32.checked_shl(u32::from(level.saturating_sub(1))),
        }
    }
}

/// Experience granted for defeating a monster.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpReward {
    /// Experience equals the monster level.
    Linear,
    /// Experience equals `2^(level-1)`.
    Exponential,
}

impl ExpReward {
    pub fn for_monster(self, monster_level: u8) -> u32 {
        match self {
            Self::Linear => monster_level.into(),
            Self::Exponential => 1u32
                .checked_shl(u32::from(monster_level.saturating_sub(1)))
                .unwrap_or(u32::MAX),
        }
    }
}

/// Combat rules applied when a monster cell is clicked.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPolicy {
    /// Monsters have HP equal to their level and counter-attack until defeated.
    HpPool,
    /// Monsters fall on the first click, hurting the party by the level difference.
    Threshold,
}

impl CombatPolicy {
    /// Whether `cell` no longer blocks the win condition.
    pub const fn is_cleared(self, cell: &Cell) -> bool {
        match self {
            Self::HpPool => !cell.is_monster || cell.is_dead,
            Self::Threshold => !cell.is_monster || cell.is_revealed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeConfig {
    pub rows: Coord,
    pub cols: Coord,
    /// Starting and maximum shared HP.
    pub hp: u32,
    /// Number of monsters per level, index 0 being level 1.
    pub monsters: Vec<CellCount>,
    pub level_curve: LevelCurve,
    pub exp_reward: ExpReward,
    pub combat: CombatPolicy,
}

impl ModeConfig {
    fn preset(rows: Coord, cols: Coord, hp: u32, monsters: &[CellCount], table: &[u32]) -> Self {
        Self {
            rows,
            cols,
            hp,
            monsters: monsters.to_vec(),
            level_curve: LevelCurve::Table(table.to_vec()),
            exp_reward: ExpReward::Exponential,
            combat: CombatPolicy::HpPool,
        }
    }

    pub const fn size(&self) -> Coord2 {
        (self.rows, self.cols)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.rows, self.cols)
    }

    /// Highest monster level, which is also the highest mark and the level cap.
    pub fn max_level(&self) -> u8 {
        self.monsters.len().try_into().unwrap_or(u8::MAX)
    }

    /// Configured monster count at `level`, zero for levels outside the mode.
    pub fn monsters_at(&self, level: u8) -> CellCount {
        usize::from(level)
            .checked_sub(1)
            .and_then(|index| self.monsters.get(index))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_monsters(&self) -> CellCount {
        self.monsters.iter().fold(0, |acc: CellCount, &n| acc.saturating_add(n))
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GameError::InvalidMode("board must have at least one row and column"));
        }
        if self.rows > MAX_BOARD_SIDE || self.cols > MAX_BOARD_SIDE {
            return Err(GameError::InvalidMode("board side is too large"));
        }
        if self.monsters.is_empty() || self.max_level() > MAX_SUPPORTED_LEVEL {
            return Err(GameError::InvalidMode("monster levels must be between 1 and 9"));
        }
        if self.hp == 0 {
            return Err(GameError::InvalidMode("starting HP must be positive"));
        }
        if self.total_monsters() > self.total_cells() {
            return Err(GameError::InvalidMode("more monsters than cells"));
        }
        Ok(())
    }
}

impl Default for ModeConfig {
    fn default() -> Self {
        ModeId::default().preset()
    }
}

/// Set of modes a room may be played in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCatalog {
    modes: BTreeMap<ModeId, ModeConfig>,
}

impl ModeCatalog {
    pub fn builtin() -> Self {
        Self {
            modes: ModeId::ALL.into_iter().map(|id| (id, id.preset())).collect(),
        }
    }

    /// Replaces the configuration of `id` after validating it.
    pub fn insert(&mut self, id: ModeId, config: ModeConfig) -> Result<()> {
        config.validate()?;
        self.modes.insert(id, config);
        Ok(())
    }

    /// Configuration for `id`, falling back to the built-in preset.
    pub fn get(&self, id: ModeId) -> ModeConfig {
        self.modes.get(&id).cloned().unwrap_or_else(|| id.preset())
    }
}

impl Default for ModeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
