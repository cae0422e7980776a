use crate::*;

/// What a click did to the room.
#[derive(Clone, Debug, PartialEq)]
pub enum ClickOutcome {
    NoChange,
    Revealed(usize),
    Attacked(AttackReport),
}

impl ClickOutcome {
    pub const fn has_update(&self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Whether every monster on `board` is accounted for under `policy`.
pub fn is_won(board: &Board, policy: CombatPolicy) -> bool {
    board.all_monsters_cleared(policy)
}

/// Room state machine. Every method is a pure function of the current document plus its arguments, so it can be
/// re-run against a newer snapshot when a transaction has to retry.
impl Room {
    /// `Waiting -> Playing`: lays out a preview board and arms the first-click regeneration.
    pub fn start(&mut self, player: &str, config: &ModeConfig, seed: u64) -> Result<()> {
        if !self.players.get(player).is_some_and(|p| p.is_host) {
            return Err(GameError::NotHost);
        }
        if self.game_state != GamePhase::Waiting {
            return Err(GameError::NotWaiting);
        }

        self.board = Some(RandomBoardGenerator::new(seed, SafeZone::None).generate(config));
        self.game_state = GamePhase::Playing;
        self.first_click = true;
        self.party = Party::new(config.hp);
        self.time = 0;
        self.timer_running = true;
        log::debug!("Game started in {} mode by {}", self.mode, player);
        Ok(())
    }

    /// Back to `Waiting`, dropping the board and restoring the party. Returns whether anything changed.
    pub fn reset(&mut self, config: &ModeConfig) -> bool {
        if self.game_state == GamePhase::Waiting && self.board.is_none() {
            return false;
        }

        self.board = None;
        self.game_state = GamePhase::Waiting;
        self.first_click = true;
        self.party = Party::new(config.hp);
        self.time = 0;
        self.timer_running = false;
        log::debug!("Room reset");
        true
    }

    /// Switches mode outside of a running game. A finished game goes back to the lobby first, so the party is only
    /// restored through a reset.
    pub fn change_mode(&mut self, mode: ModeId, config: &ModeConfig) -> Result<()> {
        if self.game_state.is_playing() {
            return Err(GameError::AlreadyPlaying);
        }
        if self.game_state.is_finished() {
            self.reset(config);
        }

        self.mode = mode;
        self.party.hp = config.hp;
        self.party.max_hp = config.hp;
        Ok(())
    }

    /// Advances the shared timer by one second. Returns whether it ran.
    pub fn tick(&mut self) -> bool {
        if self.game_state.is_playing() && self.timer_running {
            self.time = self.time.saturating_add(1);
            true
        } else {
            false
        }
    }

    /// Reveals or attacks the cell at `coords` on behalf of `player`.
    ///
    /// On the first click of a game the board is regenerated from `seed` with a safe zone around `coords`.
    pub fn click(
        &mut self,
        config: &ModeConfig,
        coords: Coord2,
        player: &str,
        seed: u64,
    ) -> ClickOutcome {
        if !self.game_state.is_playing() {
            return ClickOutcome::NoChange;
        }
        if self.first_click {
            if coords.0 >= config.rows || coords.1 >= config.cols {
                return ClickOutcome::NoChange;
            }
            self.board = Some(RandomBoardGenerator::new(seed, SafeZone::Around(coords)).generate(config));
            self.first_click = false;
        }
        let Some(board) = self.board.as_mut() else {
            return ClickOutcome::NoChange;
        };
        let Some(cell) = board.get_mut(coords) else {
            return ClickOutcome::NoChange;
        };
        if cell.is_marked() && cell.is_hidden() {
            return ClickOutcome::NoChange;
        }

        let outcome = if cell.is_monster {
            match resolve_attack(config, &mut self.party, cell, player) {
                Some(report) => ClickOutcome::Attacked(report),
                None => ClickOutcome::NoChange,
            }
        } else {
            match reveal_area(board, coords, player).len() {
                0 => ClickOutcome::NoChange,
                opened => ClickOutcome::Revealed(opened),
            }
        };

        if outcome.has_update() {
            self.settle(config.combat);
        }
        outcome
    }

    /// Applies the terminal transitions after a successful mutation; loss takes precedence over win.
    fn settle(&mut self, policy: CombatPolicy) {
        let Some(board) = self.board.as_mut() else {
            return;
        };

        if self.party.is_wiped() {
            board.reveal_all_monsters();
            self.game_state = GamePhase::Lost;
            self.timer_running = false;
            log::debug!("Party wiped out after {}s", self.time);
        } else if is_won(board, policy) {
            self.game_state = GamePhase::Won;
            self.timer_running = false;
            log::debug!("All monsters cleared after {}s", self.time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::board_with;
    use alloc::vec;

    const SEED: u64 = 42;

    fn tiny_mode(combat: CombatPolicy) -> ModeConfig {
        ModeConfig {
            rows: 3,
            cols: 3,
            hp: 5,
            monsters: vec![1, 1],
            level_curve: LevelCurve::Table(vec![0, 1, 99]),
            exp_reward: ExpReward::Linear,
            combat,
        }
    }

    /// A playing room on a fixed board, past the first click.
    fn playing_room(config: &ModeConfig, board: Board) -> Room {
        let mut room = Room::new("host", ModeId::Easy, config, 0);
        room.start("host", config, SEED).unwrap();
        room.board = Some(board);
        room.first_click = false;
        room
    }

    #[test]
    fn start_requires_host_and_waiting() {
        let config = ModeId::Easy.preset();
        let mut room = Room::new("host", ModeId::Easy, &config, 0);
        join_players(&mut room.players, "guest").unwrap();

        assert_eq!(room.start("guest", &config, SEED), Err(GameError::NotHost));
        room.start("host", &config, SEED).unwrap();
        assert_eq!(room.game_state, GamePhase::Playing);
        assert!(room.first_click);
        assert!(room.timer_running);
        assert_eq!(room.start("host", &config, SEED), Err(GameError::NotWaiting));
    }

    #[test]
    fn first_click_regenerates_with_safe_zone() {
        let config = ModeId::Easy.preset();
        let mut room = Room::new("host", ModeId::Easy, &config, 0);
        room.start("host", &config, SEED).unwrap();

        let outcome = room.click(&config, (8, 8), "host", 1234);

        assert!(matches!(outcome, ClickOutcome::Revealed(_)));
        assert!(!room.first_click);
        let board = room.board.as_ref().unwrap();
        for row in 7..=9 {
            for col in 7..=9 {
                assert!(!board[(row, col)].is_monster);
            }
        }
        assert_eq!(board.monster_count(), 30);
        assert_eq!(room.party, Party::new(10));
    }

    #[test]
    fn actions_outside_play_are_ignored() {
        let config = ModeId::Easy.preset();
        let mut room = Room::new("host", ModeId::Easy, &config, 0);
        let before = room.clone();

        assert_eq!(room.click(&config, (0, 0), "host", SEED), ClickOutcome::NoChange);
        assert!(!room.tick());
        assert_eq!(room, before);
    }

    #[test]
    fn out_of_bounds_first_click_keeps_preview() {
        let config = ModeId::Easy.preset();
        let mut room = Room::new("host", ModeId::Easy, &config, 0);
        room.start("host", &config, SEED).unwrap();

        assert_eq!(room.click(&config, (16, 0), "host", SEED), ClickOutcome::NoChange);
        assert!(room.first_click);
    }

    #[test]
    fn marked_cell_blocks_click() {
        let config = tiny_mode(CombatPolicy::HpPool);
        let mut board = board_with((3, 3), &[((0, 0), 1)]);
        board[(2, 2)].mark = 1;
        let mut room = playing_room(&config, board);

        assert_eq!(room.click(&config, (2, 2), "host", SEED), ClickOutcome::NoChange);
    }

    #[test]
    fn clearing_last_monster_wins() {
        let config = tiny_mode(CombatPolicy::Threshold);
        let board = board_with((3, 3), &[((0, 0), 1)]);
        let mut room = playing_room(&config, board);

        let outcome = room.click(&config, (0, 0), "host", SEED);

        assert!(matches!(outcome, ClickOutcome::Attacked(ref r) if r.defeated));
        assert_eq!(room.game_state, GamePhase::Won);
        assert!(!room.timer_running);
        assert_eq!(room.party.level, 2);
    }

    #[test]
    fn wipe_loses_and_reveals_all_monsters() {
        let config = ModeConfig {
            hp: 2,
            ..tiny_mode(CombatPolicy::HpPool)
        };
        let board = board_with((3, 3), &[((0, 0), 2), ((2, 2), 2)]);
        let mut room = playing_room(&config, board);

        room.click(&config, (0, 0), "host", SEED);

        assert_eq!(room.game_state, GamePhase::Lost);
        assert_eq!(room.party.hp, 0);
        assert!(!room.timer_running);
        let board = room.board.as_ref().unwrap();
        assert!(board[(2, 2)].is_revealed);
        assert!(!board[(1, 1)].is_revealed);

        assert_eq!(room.click(&config, (1, 1), "host", SEED), ClickOutcome::NoChange);
    }

    #[test]
    fn hp_pool_revealed_monster_can_be_attacked_again() {
        let config = tiny_mode(CombatPolicy::HpPool);
        let board = board_with((3, 3), &[((0, 0), 2), ((2, 2), 1)]);
        let mut room = playing_room(&config, board);

        room.click(&config, (0, 0), "host", SEED);
        assert_eq!(room.party.hp, 3);
        let outcome = room.click(&config, (0, 0), "host", SEED);

        assert!(matches!(outcome, ClickOutcome::Attacked(ref r) if r.defeated));
        assert_eq!(room.party.hp, 3);
        assert_eq!(room.game_state, GamePhase::Playing);
    }

    #[test]
    fn revealed_safe_cell_is_a_no_op() {
        let config = tiny_mode(CombatPolicy::HpPool);
        let board = board_with((3, 3), &[((0, 0), 1)]);
        let mut room = playing_room(&config, board);

        assert_eq!(room.click(&config, (1, 1), "host", SEED), ClickOutcome::Revealed(1));
        assert_eq!(room.click(&config, (1, 1), "guest", SEED), ClickOutcome::NoChange);
        assert_eq!(
            room.board.as_ref().unwrap()[(1, 1)].revealed_by.as_deref(),
            Some("host")
        );
    }

    #[test]
    fn reset_and_mode_change() {
        let config = ModeId::Easy.preset();
        let mut room = Room::new("host", ModeId::Easy, &config, 0);
        room.start("host", &config, SEED).unwrap();
        room.tick();
        assert_eq!(room.time, 1);

        assert_eq!(
            room.change_mode(ModeId::Huge, &ModeId::Huge.preset()),
            Err(GameError::AlreadyPlaying)
        );
        assert!(room.reset(&config));
        assert!(!room.reset(&config));
        assert_eq!(room.game_state, GamePhase::Waiting);
        assert!(room.board.is_none());
        assert_eq!(room.time, 0);

        room.change_mode(ModeId::Huge, &ModeId::Huge.preset()).unwrap();
        assert_eq!(room.mode, ModeId::Huge);
        assert_eq!(room.party.max_hp, 30);
    }

    #[test]
    fn mode_change_after_a_loss_returns_to_lobby() {
        let config = ModeConfig {
            hp: 2,
            ..tiny_mode(CombatPolicy::HpPool)
        };
        let mut room = playing_room(&config, board_with((3, 3), &[((0, 0), 2)]));
        room.click(&config, (0, 0), "host", SEED);
        assert_eq!(room.game_state, GamePhase::Lost);

        let huge = ModeId::Huge.preset();
        room.change_mode(ModeId::Huge, &huge).unwrap();

        assert_eq!(room.game_state, GamePhase::Waiting);
        assert!(room.board.is_none());
        assert!(room.first_click);
        assert_eq!(room.party, Party::new(huge.hp));
        assert_eq!(room.time, 0);
    }

    #[test]
    fn random_play_keeps_combat_monotonic_and_outcomes_exclusive() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        for combat in [CombatPolicy::HpPool, CombatPolicy::Threshold] {
            let config = ModeConfig {
                rows: 8,
                cols: 8,
                hp: 12,
                monsters: vec![6, 4, 2],
                level_curve: LevelCurve::PowerOfTwo,
                exp_reward: ExpReward::Linear,
                combat,
            };
            for seed in 0..16 {
                let mut rng = SmallRng::seed_from_u64(seed);
                let mut room = Room::new("host", ModeId::Easy, &config, 0);
                room.start("host", &config, seed).unwrap();

                for _ in 0..400 {
                    let before = room.clone();
                    let coords = (rng.random_range(0..8), rng.random_range(0..8));
                    let outcome = room.click(&config, coords, "host", seed);

                    assert!(room.party.hp <= before.party.hp);
                    assert!(room.party.level >= before.party.level);
                    assert!(room.party.exp >= before.party.exp);
                    if let (Some(old), Some(new)) = (before.board.as_ref(), room.board.as_ref()) {
                        if !before.first_click {
                            for (pos, cell) in old.iter() {
                                assert!(!cell.is_revealed || new[pos].is_revealed);
                                assert!(!cell.is_dead || new[pos].is_dead);
                            }
                        }
                    }
                    match room.game_state {
                        GamePhase::Lost => assert!(room.party.is_wiped()),
                        GamePhase::Won => {
                            assert!(!room.party.is_wiped());
                            assert!(is_won(room.board.as_ref().unwrap(), combat));
                        }
                        GamePhase::Playing => {}
                        GamePhase::Waiting => panic!("click left the game"),
                    }
                    if before.game_state.is_finished() {
                        assert_eq!(outcome, ClickOutcome::NoChange);
                        assert_eq!(room, before);
                    }
                }
            }
        }
    }
}
