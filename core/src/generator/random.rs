use super::*;

/// Attempts allowed per cell when placing one level of monsters.
pub const PLACEMENT_ATTEMPTS_PER_CELL: u32 = 10;

/// Generation strategy that drops monsters on uniformly random free cells, level by level, keeping the optional safe
/// zone clear.
///
/// Placement for a level gives up after `rows * cols * 10` attempts, so very dense modes on small boards can end up
/// with fewer monsters than configured.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomBoardGenerator {
    seed: u64,
    safe_zone: SafeZone,
}

impl RandomBoardGenerator {
    pub fn new(seed: u64, safe_zone: SafeZone) -> Self {
        Self { seed, safe_zone }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(self, config: &ModeConfig) -> Board {
        use rand::prelude::*;

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut board = Board::empty(config.size());
        let (rows, cols) = config.size();
        let max_attempts = u32::from(config.total_cells()) * PLACEMENT_ATTEMPTS_PER_CELL;
        if max_attempts == 0 {
            return board;
        }

        for level in 1..=config.max_level() {
            let wanted = config.monsters_at(level);
            let mut placed = 0;
            let mut attempts = 0;

            while placed < wanted && attempts < max_attempts {
                attempts += 1;
                let coords = (rng.random_range(0..rows), rng.random_range(0..cols));
                if board[coords].is_monster || self.safe_zone.contains(coords) {
                    continue;
                }
                board[coords] = Cell::monster(level);
                placed += 1;
            }

            if placed < wanted {
                log::warn!(
                    "Placement budget exhausted for level {}, placed {} of {}",
                    level,
                    placed,
                    wanted
                );
            }
        }

        board.compute_neighbor_sums();
        log::debug!(
            "Generated {}x{} board with {} monsters, safe zone {:?}",
            rows,
            cols,
            board.monster_count(),
            self.safe_zone
        );
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn places_configured_counts() {
        for id in ModeId::ALL {
            let config = id.preset();
            let board = RandomBoardGenerator::new(7, SafeZone::None).generate(&config);

            assert_eq!(board.size(), config.size());
            assert_eq!(board.monster_counts(config.max_level()), config.monsters, "{id}");
        }
    }

    #[test]
    fn safe_zone_is_free_of_monsters() {
        let config = ModeId::Extreme.preset();
        for seed in 0..32 {
            let center = ((seed % 16) as Coord, (seed * 7 % 30) as Coord);
            let board = RandomBoardGenerator::new(seed, SafeZone::Around(center)).generate(&config);

            for (coords, cell) in board.iter() {
                if is_adjacent_or_same(center, coords) {
                    assert!(!cell.is_monster, "seed {seed} monster at {coords:?}");
                }
            }
        }
    }

    #[test]
    fn easy_first_click_scenario() {
        let config = ModeId::Easy.preset();
        let board = RandomBoardGenerator::new(99, SafeZone::Around((8, 8))).generate(&config);

        for row in 7..=9 {
            for col in 7..=9 {
                assert!(!board[(row, col)].is_monster);
            }
        }
        assert_eq!(board.monster_count(), 30);
    }

    #[test]
    fn neighbor_sums_match_placement() {
        let config = ModeId::Normal.preset();
        let board = RandomBoardGenerator::new(3, SafeZone::None).generate(&config);

        for (coords, cell) in board.iter() {
            let expected: u16 = board
                .iter_neighbors(coords)
                .map(|pos| u16::from(board[pos].monster_level))
                .sum();
            assert_eq!(cell.neighbor_sum, expected);
        }
    }

    #[test]
    fn monsters_start_with_full_hp() {
        let config = ModeId::Easy.preset();
        let board = RandomBoardGenerator::new(11, SafeZone::None).generate(&config);

        for (_, cell) in board.iter().filter(|(_, cell)| cell.is_monster) {
            assert_eq!(cell.monster_hp, i32::from(cell.monster_level));
            assert_eq!(cell.monster_max_hp, cell.monster_hp);
        }
    }

    #[test]
    fn same_seed_same_board() {
        let config = ModeId::Easy.preset();
        let a = RandomBoardGenerator::new(5, SafeZone::Around((0, 0))).generate(&config);
        let b = RandomBoardGenerator::new(5, SafeZone::Around((0, 0))).generate(&config);
        assert_eq!(a, b);
    }

    #[test]
    fn dense_board_degrades_instead_of_failing() {
        let config = ModeConfig {
            rows: 3,
            cols: 3,
            hp: 1,
            monsters: vec![5],
            level_curve: LevelCurve::PowerOfTwo,
            exp_reward: ExpReward::Linear,
            combat: CombatPolicy::Threshold,
        };
        let board = RandomBoardGenerator::new(1, SafeZone::Around((1, 1))).generate(&config);

        assert_eq!(board.monster_count(), 0);
    }
}
