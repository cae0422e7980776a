//! Headless room with bot players, each on its own thread, sharing one in-memory store.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use mamono_core::*;
use mamono_sync::{ActionOutcome, Clock, ClientConfig, MemoryStore, RoomClient, SystemClock};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

type Bot = RoomClient<Arc<MemoryStore>, SystemClock>;

/// Milliseconds between timer ticks.
const TICK_MS: u64 = 1_000;

const MARKED_PENALTY: u32 = 1_000_000;

#[derive(Clone, Debug)]
pub struct SimOptions {
    pub mode: ModeId,
    pub players: u8,
    pub seed: u64,
    pub max_moves: u32,
    pub think: Duration,
    pub modes: ModeCatalog,
    pub client: ClientConfig,
}

/// Final state of a simulated room.
#[derive(Clone, Debug)]
pub struct Summary {
    pub code: String,
    pub room: Room,
    pub config: ModeConfig,
    pub moves: u32,
}

pub fn run(options: &SimOptions) -> Result<Summary> {
    let store = Arc::new(MemoryStore::new());
    let mut bots = Vec::with_capacity(options.players.into());
    for index in 0..options.players.max(1) {
        let name = format!("bot{}", index + 1);
        let seed = options.seed.wrapping_add(index.into());
        let client = RoomClient::new(store.clone(), SystemClock, &name, seed)?
            .with_modes(options.modes.clone())
            .with_config(options.client.clone());
        bots.push(client);
    }

    let code = bots[0].create_room(options.mode)?;
    for bot in &mut bots[1..] {
        bot.join_room(code.as_str())?;
    }
    bots[0].start()?;
    log::info!("Room {} started with {} players", code, bots.len());

    let done = AtomicBool::new(false);
    let moves = AtomicU32::new(0);
    thread::scope(|scope| {
        for (index, bot) in bots.iter_mut().enumerate() {
            let (done, moves) = (&done, &moves);
            let seed = options.seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            scope.spawn(move || play(bot, index == 0, seed, options, done, moves));
        }
    });

    let host = &mut bots[0];
    host.refresh();
    let room = host.view().cloned().context("Room disappeared during the game")?;
    Ok(Summary {
        code: code.to_string(),
        config: options.modes.get(room.mode),
        room,
        moves: moves.load(Ordering::SeqCst),
    })
}

/// Bot loop: keeps moving until the game ends, the move budget runs out, or another bot stops the table.
fn play(bot: &mut Bot, keeps_time: bool, seed: u64, options: &SimOptions, done: &AtomicBool, moves: &AtomicU32) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut last_tick = SystemClock.now_ms();

    while !done.load(Ordering::SeqCst) {
        bot.refresh();
        bot.run_due();
        if let Some(event) = bot.poll_damage_event() {
            log::debug!("{} sees {:?} at ({}, {})", bot.player(), event.kind, event.row, event.col);
        }

        if keeps_time && SystemClock.now_ms().saturating_sub(last_tick) >= TICK_MS {
            last_tick += TICK_MS;
            bot.tick();
        }

        let Some(room) = bot.view() else {
            break;
        };
        if !room.game_state.is_playing() {
            done.store(true, Ordering::SeqCst);
            break;
        }

        if moves.fetch_add(1, Ordering::SeqCst) >= options.max_moves {
            log::info!("Move budget of {} spent", options.max_moves);
            done.store(true, Ordering::SeqCst);
            break;
        }

        let Some(choice) = choose(room, &mut rng) else {
            done.store(true, Ordering::SeqCst);
            break;
        };
        let outcome = match choice {
            Move::Click(coords) => bot.click(coords),
            Move::Mark(coords) => bot.cycle_mark(coords),
            Move::Unmark(coords) => bot.clear_mark(coords),
            Move::Pin(coords) => bot.toggle_pin(coords),
        };
        if let ActionOutcome::Applied(effects) = &outcome {
            for effect in effects {
                log::debug!("{}: {:?}", bot.player(), effect);
            }
        }

        thread::sleep(options.think);
    }

    bot.run_due();
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Move {
    Click(Coord2),
    Mark(Coord2),
    Unmark(Coord2),
    Pin(Coord2),
}

/// Picks a move from what a player can see: finishes wounded monsters it can kill outright, otherwise opens the
/// hidden cell with the least visible danger around it. Marked cells are only taken back once nothing else is left.
fn choose(room: &Room, rng: &mut impl Rng) -> Option<Move> {
    let board = room.board.as_ref()?;

    let finisher = board.iter().find(|(_, cell)| {
        cell.is_revealed && cell.is_live_monster() && cell.monster_hp <= i32::from(room.party.level)
    });
    if let Some((coords, _)) = finisher {
        return Some(Move::Click(coords));
    }

    let mut best: Vec<(Coord2, u32)> = Vec::new();
    for (coords, cell) in board.iter() {
        if !cell.is_hidden() {
            continue;
        }
        let risk = danger(board, coords) + if cell.is_marked() { MARKED_PENALTY } else { 0 };
        match best.first() {
            Some(&(_, lowest)) if risk > lowest => {}
            Some(&(_, lowest)) if risk == lowest => best.push((coords, risk)),
            _ => best = vec![(coords, risk)],
        }
    }
    if best.is_empty() {
        return board
            .iter()
            .find(|(_, cell)| cell.is_revealed && cell.is_live_monster())
            .map(|(coords, _)| Move::Click(coords));
    }
    let &(coords, risk) = best.get(rng.random_range(0..best.len()))?;
    if risk >= MARKED_PENALTY {
        return Some(Move::Unmark(coords));
    }

    // risky guesses are sometimes annotated instead of clicked
    if risk > 1_000 && rng.random_ratio(1, 8) {
        return Some(Move::Mark(coords));
    }
    if rng.random_ratio(1, 25) {
        return Some(Move::Pin(coords));
    }
    Some(Move::Click(coords))
}

/// Lowest expected monster level per hidden neighbor among the revealed numbers around `coords`, in thousandths.
fn danger(board: &Board, coords: Coord2) -> u32 {
    board
        .iter_neighbors(coords)
        .filter_map(|neighbor| {
            let cell = board.get(neighbor)?;
            if !cell.is_revealed || cell.is_monster {
                return None;
            }
            let hidden = board
                .iter_neighbors(neighbor)
                .filter(|&n| board.get(n).is_some_and(Cell::is_hidden))
                .count() as u32;
            Some(u32::from(cell.neighbor_sum) * 1_000 / hidden.max(1))
        })
        .min()
        .unwrap_or(1_500)
}

impl Summary {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let room = &self.room;
        let party = &room.party;
        let _ = writeln!(
            out,
            "room {} ({}): {:?} after {}s and {} moves",
            self.code, room.mode, room.game_state, room.time, self.moves
        );
        let _ = writeln!(
            out,
            "party: Lv{} exp {} hp {}/{}",
            party.level, party.exp, party.hp, party.max_hp
        );
        let _ = writeln!(
            out,
            "monsters cleared: {}/{}",
            room.monsters_cleared(&self.config),
            room.board.as_ref().map_or(0, Board::monster_count)
        );

        let mut reveals: BTreeMap<&str, usize> = room.players.keys().map(|name| (name.as_str(), 0)).collect();
        if let Some(board) = room.board.as_ref() {
            for (_, cell) in board.iter() {
                if let Some(name) = cell.revealed_by.as_deref() {
                    *reveals.entry(name).or_default() += 1;
                }
            }
        }
        for (name, count) in reveals {
            let _ = writeln!(out, "  {:<8} {:>4} cells", name, count);
        }

        if let Some(board) = room.board.as_ref() {
            out.push_str(&render_board(board));
        }
        out
    }
}

/// One character per cell: `#` hidden, `?` marked, `.` empty, digits for sums, `*` defeated and `!` live monsters.
pub fn render_board(board: &Board) -> String {
    let (rows, cols) = board.size();
    let mut out = String::with_capacity(usize::from(rows) * (usize::from(cols) + 1));
    for row in 0..rows {
        for col in 0..cols {
            let cell = &board[(row, col)];
            let c = match cell {
                c if c.is_hidden() && c.is_marked() => '?',
                c if c.is_hidden() => '#',
                c if c.is_monster && c.is_dead => '*',
                c if c.is_monster => '!',
                c if c.neighbor_sum == 0 => '.',
                c => char::from_digit(c.neighbor_sum.into(), 36).unwrap_or('+'),
            };
            out.push(c);
        }
        out.push('\n');
    }
    out
}
