use std::collections::BTreeMap;

use futures_util::{FutureExt, StreamExt};
use mamono_core::*;
use mamono_protocol::{RoomCode, StorePath, decode, encode, validate_key};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::Result;
use crate::*;

/// What a gameplay action ended up doing.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionOutcome {
    /// A transaction committed; the cues are derived from the committing attempt only.
    Applied(Vec<Effect>),
    /// Guards inside the transaction left the document as it was.
    Unchanged,
    /// The store failed and the action was discarded.
    Dropped,
}

impl ActionOutcome {
    pub const fn has_update(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn effects(&self) -> &[Effect] {
        match self {
            Self::Applied(effects) => effects,
            _ => &[],
        }
    }
}

/// Room snapshots of the attempt that committed.
struct Committed {
    before: Room,
    after: Room,
}

/// Runs `body` as an optimistic transaction over the whole room document.
///
/// `body` returns `Ok(true)` to commit its changes, `Ok(false)` to leave the room untouched, or an error to abort.
/// It may run several times and must only depend on the room it is handed.
fn transact_room<S>(
    store: &S,
    code: &RoomCode,
    mut body: impl FnMut(&mut Room) -> mamono_core::Result<bool>,
) -> Result<Option<Committed>>
where
    S: DocumentStore + ?Sized,
{
    let path = StorePath::room(code);
    let mut outcome: Result<Option<Committed>> = Ok(None);

    let tx = store.transact(&path, &mut |current| {
        let before: Room = match decode(current) {
            Ok(Some(room)) => room,
            Ok(None) => {
                outcome = Err(ClientError::RoomNotFound(code.to_string()));
                return TxDecision::Abort;
            }
            Err(err) => {
                outcome = Err(err.into());
                return TxDecision::Abort;
            }
        };

        let mut after = before.clone();
        match body(&mut after) {
            Ok(true) => match encode(&after) {
                Ok(next) => {
                    outcome = Ok(Some(Committed { before, after }));
                    TxDecision::Commit(Some(next))
                }
                Err(err) => {
                    outcome = Err(err.into());
                    TxDecision::Abort
                }
            },
            Ok(false) => {
                outcome = Ok(None);
                TxDecision::Abort
            }
            Err(err) => {
                outcome = Err(err.into());
                TxDecision::Abort
            }
        }
    })?;

    if !tx.committed && matches!(outcome, Ok(Some(_))) {
        return Ok(None);
    }
    outcome
}

/// Runs `body` as an optimistic transaction over a single cell. Missing cells (no board yet) are left alone.
///
/// Returns whether a change was committed.
fn transact_cell<S>(
    store: &S,
    code: &RoomCode,
    coords: Coord2,
    mut body: impl FnMut(&mut Cell) -> bool,
) -> Result<bool>
where
    S: DocumentStore + ?Sized,
{
    let path = StorePath::cell(code, coords);
    let mut failure: Option<ClientError> = None;

    let tx = store.transact(&path, &mut |current| {
        failure = None;
        let mut cell: Cell = match decode(current) {
            Ok(Some(cell)) => cell,
            Ok(None) => return TxDecision::Abort,
            Err(err) => {
                failure = Some(err.into());
                return TxDecision::Abort;
            }
        };
        if !body(&mut cell) {
            return TxDecision::Abort;
        }
        match encode(&cell) {
            Ok(next) => TxDecision::Commit(Some(next)),
            Err(err) => {
                failure = Some(err.into());
                TxDecision::Abort
            }
        }
    })?;

    match failure {
        Some(err) => Err(err),
        None => Ok(tx.committed),
    }
}

/// One player's connection to a room: issues transactions, follows the shared document and owns the client-local
/// bits (long press, delayed writes, effect de-duplication).
pub struct RoomClient<S, C> {
    store: S,
    clock: C,
    modes: ModeCatalog,
    config: ClientConfig,
    rng: SmallRng,
    player: String,
    room: Option<RoomCode>,
    view: Option<Room>,
    subscription: Option<Subscription>,
    schedule: ScheduledWrites,
    press: LongPress,
    feed: EffectFeed,
}

impl<S: DocumentStore, C: Clock> RoomClient<S, C> {
    /// Creates a client for `player`. The name is trimmed and must be usable as a store key.
    pub fn new(store: S, clock: C, player: &str, seed: u64) -> Result<Self> {
        let player = player.trim();
        if player.is_empty() {
            return Err(GameError::EmptyName.into());
        }
        validate_key(player)?;

        let config = ClientConfig::default();
        Ok(Self {
            store,
            clock,
            modes: ModeCatalog::builtin(),
            feed: EffectFeed::new(config.effect_ttl_ms),
            config,
            rng: SmallRng::seed_from_u64(seed),
            player: player.to_string(),
            room: None,
            view: None,
            subscription: None,
            schedule: ScheduledWrites::new(),
            press: LongPress::new(),
        })
    }

    pub fn with_modes(mut self, modes: ModeCatalog) -> Self {
        self.modes = modes;
        self
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.feed = EffectFeed::new(config.effect_ttl_ms);
        self.config = config;
        self
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn room_code(&self) -> Option<&RoomCode> {
        self.room.as_ref()
    }

    /// Last room document received from the store.
    pub fn view(&self) -> Option<&Room> {
        self.view.as_ref()
    }

    pub fn pending_writes(&self) -> usize {
        self.schedule.len()
    }

    /// Creates a new room with this player as host and enters it.
    pub fn create_room(&mut self, mode: ModeId) -> Result<RoomCode> {
        let code = RoomCode::parse(&generate_room_code(&mut self.rng))?;
        let config = self.modes.get(mode);
        let room = Room::new(&self.player, mode, &config, self.clock.now_ms());

        self.store.set(&StorePath::room(&code), Some(encode(&room)?))?;
        log::info!("{} created room {} ({})", self.player, code, mode);
        self.enter(code.clone())?;
        Ok(code)
    }

    /// Joins an existing room. Codes are normalized; taken names are rejected.
    pub fn join_room(&mut self, code: &str) -> Result<()> {
        let code = RoomCode::parse(code)?;
        if self.store.get(&StorePath::room(&code))?.is_none() {
            return Err(ClientError::RoomNotFound(code.to_string()));
        }

        let player = self.player.clone();
        let mut outcome: Result<()> = Ok(());
        self.store.transact(&StorePath::players(&code), &mut |current| {
            let mut players: BTreeMap<String, Player> = match decode(current) {
                Ok(players) => players.unwrap_or_default(),
                Err(err) => {
                    outcome = Err(err.into());
                    return TxDecision::Abort;
                }
            };
            if let Err(err) = join_players(&mut players, &player) {
                outcome = Err(err.into());
                return TxDecision::Abort;
            }
            match encode(&players) {
                Ok(next) => {
                    outcome = Ok(());
                    TxDecision::Commit(Some(next))
                }
                Err(err) => {
                    outcome = Err(err.into());
                    TxDecision::Abort
                }
            }
        })?;
        outcome?;

        log::info!("{} joined room {}", self.player, code);
        self.enter(code)
    }

    /// Removes this player from the room and stops following it.
    pub fn leave(&mut self) -> Result<()> {
        let code = self.room.take().ok_or(ClientError::NotInRoom)?;
        self.subscription = None;
        self.view = None;
        self.press.release();
        self.store.set(&StorePath::player(&code, &self.player)?, None)?;
        log::info!("{} left room {}", self.player, code);
        Ok(())
    }

    /// Host only: lays out the board and starts the timer.
    pub fn start(&mut self) -> Result<()> {
        let code = self.room.clone().ok_or(ClientError::NotInRoom)?;
        let seed: u64 = self.rng.random();
        let (player, modes) = (&self.player, &self.modes);
        transact_room(&self.store, &code, |room| {
            let config = modes.get(room.mode);
            room.start(player, &config, seed).map(|()| true)
        })?;
        self.refresh();
        Ok(())
    }

    /// Returns the room to the lobby. Returns whether anything changed.
    pub fn reset(&mut self) -> Result<bool> {
        let code = self.room.clone().ok_or(ClientError::NotInRoom)?;
        let modes = &self.modes;
        let committed = transact_room(&self.store, &code, |room| {
            let config = modes.get(room.mode);
            Ok(room.reset(&config))
        })?;
        self.refresh();
        Ok(committed.is_some())
    }

    pub fn change_mode(&mut self, mode: ModeId) -> Result<()> {
        let code = self.room.clone().ok_or(ClientError::NotInRoom)?;
        let config = self.modes.get(mode);
        transact_room(&self.store, &code, |room| room.change_mode(mode, &config).map(|()| true))?;
        self.refresh();
        Ok(())
    }

    /// Reveals or attacks a cell. Cues come from the committing attempt, and combat is broadcast as a damage event.
    pub fn click(&mut self, coords: Coord2) -> ActionOutcome {
        let Some(code) = self.room.clone() else {
            log::warn!("{} clicked {:?} outside of a room", self.player, coords);
            return ActionOutcome::Dropped;
        };
        // drawn up front so every retry of the first click lays out the same board
        let seed: u64 = self.rng.random();
        let (player, modes) = (&self.player, &self.modes);

        let committed = transact_room(&self.store, &code, |room| {
            let config = modes.get(room.mode);
            Ok(room.click(&config, coords, player, seed).has_update())
        });

        let outcome = match committed {
            Ok(Some(Committed { before, after })) => {
                let effects = diff_effects(&before, &after, coords);
                self.broadcast_damage(&code, &effects);
                ActionOutcome::Applied(effects)
            }
            Ok(None) => ActionOutcome::Unchanged,
            Err(err) => {
                log::warn!("Dropping click at {:?}: {}", coords, err);
                ActionOutcome::Dropped
            }
        };
        self.refresh();
        outcome
    }

    fn broadcast_damage(&mut self, code: &RoomCode, effects: &[Effect]) {
        let now = self.clock.now_ms();
        let id = u64::from(self.rng.random::<u32>());
        let Some(event) = damage_event_for(effects, id, now) else {
            return;
        };
        let written = encode(&event)
            .map_err(StoreError::from)
            .and_then(|value| self.store.set(&StorePath::damage_event(code), Some(value)));
        if let Err(err) = written {
            log::warn!("Could not broadcast damage event: {}", err);
        }
    }

    /// Advances the shared timer by a second while a game is running.
    pub fn tick(&mut self) -> ActionOutcome {
        let Some(code) = self.room.clone() else {
            return ActionOutcome::Dropped;
        };
        let outcome = match transact_room(&self.store, &code, |room| Ok(room.tick())) {
            Ok(Some(_)) => ActionOutcome::Applied(Vec::new()),
            Ok(None) => ActionOutcome::Unchanged,
            Err(err) => {
                log::warn!("Dropping timer tick: {}", err);
                ActionOutcome::Dropped
            }
        };
        self.refresh();
        outcome
    }

    /// Mode of the room while a game is running, as last seen.
    fn playing_mode(&mut self) -> Option<ModeConfig> {
        self.refresh();
        let room = self.view.as_ref()?;
        room.game_state.is_playing().then(|| self.modes.get(room.mode))
    }

    fn apply_to_cell(
        &mut self,
        coords: Coord2,
        what: &str,
        mut body: impl FnMut(&mut Cell) -> bool,
    ) -> ActionOutcome {
        let Some(code) = self.room.clone() else {
            log::warn!("{} outside of a room", what);
            return ActionOutcome::Dropped;
        };
        let outcome = match transact_cell(&self.store, &code, coords, &mut body) {
            Ok(true) => ActionOutcome::Applied(Vec::new()),
            Ok(false) => ActionOutcome::Unchanged,
            Err(err) => {
                log::warn!("Dropping {} at {:?}: {}", what, coords, err);
                ActionOutcome::Dropped
            }
        };
        self.refresh();
        outcome
    }

    /// Advances the hint on a hidden cell.
    pub fn cycle_mark(&mut self, coords: Coord2) -> ActionOutcome {
        let Some(config) = self.playing_mode() else {
            return ActionOutcome::Unchanged;
        };
        let max_level = config.max_level();
        let player = self.player.clone();
        self.apply_to_cell(coords, "mark", |cell| {
            cycle_mark(cell, max_level, &player).has_update()
        })
    }

    /// Sets the hint from a typed digit; digits above the mode's top level are ignored.
    pub fn set_mark(&mut self, coords: Coord2, digit: u8) -> ActionOutcome {
        let Some(config) = self.playing_mode() else {
            return ActionOutcome::Unchanged;
        };
        let mark = match validate_mark(digit, config.max_level()) {
            Ok(mark) => mark,
            Err(err) => {
                log::debug!("Ignoring key: {}", err);
                return ActionOutcome::Unchanged;
            }
        };
        let player = self.player.clone();
        self.apply_to_cell(coords, "mark", |cell| set_mark(cell, mark, &player).has_update())
    }

    pub fn clear_mark(&mut self, coords: Coord2) -> ActionOutcome {
        if self.playing_mode().is_none() {
            return ActionOutcome::Unchanged;
        }
        self.apply_to_cell(coords, "mark", |cell| clear_mark(cell).has_update())
    }

    /// Flips a defeated monster between its icon and its neighbor sum.
    pub fn toggle_number(&mut self, coords: Coord2) -> ActionOutcome {
        if self.playing_mode().is_none() {
            return ActionOutcome::Unchanged;
        }
        self.apply_to_cell(coords, "number toggle", |cell| toggle_number(cell).has_update())
    }

    /// Flips the pin on a cell. Pinning on also sends two staggered ripples to every player.
    pub fn toggle_pin(&mut self, coords: Coord2) -> ActionOutcome {
        if self.playing_mode().is_none() {
            return ActionOutcome::Unchanged;
        }
        let player = self.player.clone();
        let mut pinned = false;
        let outcome = self.apply_to_cell(coords, "pin", |cell| {
            pinned = toggle_pin(cell, &player).is_pinned();
            true
        });

        if outcome.has_update()
            && pinned
            && let Some(code) = self.room.clone()
        {
            let color = self.own_color();
            self.send_ripple(&code, coords, color.clone());
            let due = self.clock.now_ms() + self.config.ripple_echo_delay_ms;
            self.schedule.schedule(due, Deferred::Ripple { coords, color });
            self.refresh();
        }
        outcome
    }

    fn own_color(&self) -> String {
        self.view
            .as_ref()
            .map_or(UNKNOWN_PLAYER_COLOR, |room| room.color_of(&self.player))
            .to_string()
    }

    /// Writes one ripple and queues its cleanup.
    fn send_ripple(&mut self, code: &RoomCode, (row, col): Coord2, color: String) {
        let now = self.clock.now_ms();
        let id = format!("{}{:04x}", now, self.rng.random::<u16>());
        let ripple = Ripple {
            row,
            col,
            color,
            timestamp: now,
        };

        let written = StorePath::ripple(code, &id).map_err(StoreError::from).and_then(|path| {
            let value = encode(&ripple)?;
            self.store.set(&path, Some(value))?;
            Ok(path)
        });
        match written {
            Ok(path) => self
                .schedule
                .schedule(now + self.config.effect_ttl_ms, Deferred::Delete(path)),
            Err(err) => log::warn!("Could not send ripple: {}", err),
        }
    }

    /// Performs every delayed write that has come due. Returns how many ran.
    pub fn run_due(&mut self) -> usize {
        let due = self.schedule.take_due(self.clock.now_ms());
        let count = due.len();
        for write in due {
            match write {
                Deferred::Delete(path) => {
                    if let Err(err) = self.store.set(&path, None) {
                        log::warn!("Could not clean up {}: {}", path, err);
                    }
                }
                Deferred::Ripple { coords, color } => {
                    if let Some(code) = self.room.clone() {
                        self.send_ripple(&code, coords, color);
                    }
                }
            }
        }
        if count > 0 {
            self.refresh();
        }
        count
    }

    /// Secondary press went down: the mark cycles now, and clears if the press is held long enough.
    pub fn press_mark(&mut self, coords: Coord2) -> ActionOutcome {
        self.press.press(coords, self.clock.now_ms());
        self.cycle_mark(coords)
    }

    /// Clears the mark under a press held past the threshold.
    pub fn poll_press(&mut self) -> Option<ActionOutcome> {
        let coords = self.press.poll(self.clock.now_ms(), self.config.long_press_ms)?;
        Some(self.clear_mark(coords))
    }

    /// Secondary press went up. Returns whether a pending clear was cancelled.
    pub fn release_press(&mut self) -> bool {
        self.press.release()
    }

    /// Damage event from the latest view that this client has not shown yet.
    pub fn poll_damage_event(&mut self) -> Option<DamageEvent> {
        self.refresh();
        let now = self.clock.now_ms();
        self.feed.poll(self.view.as_ref()?, now)
    }

    /// Ripples to display right now, as `(row, col, color)`.
    pub fn ripples(&self) -> Vec<(Coord, Coord, &str)> {
        let now = self.clock.now_ms();
        self.view
            .as_ref()
            .map_or_else(Vec::new, |room| self.feed.ripples(room, now))
    }

    /// Applies every pushed update received so far. Returns whether the view changed.
    pub fn refresh(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };

        let mut latest: Option<Option<Value>> = None;
        let mut closed = false;
        while let Some(update) = subscription.next().now_or_never() {
            match update {
                Some(value) => latest = Some(value),
                None => {
                    closed = true;
                    break;
                }
            }
        }
        if closed {
            log::warn!("Room subscription closed");
            self.subscription = None;
        }

        let Some(value) = latest else {
            return false;
        };
        match decode::<Room>(value.as_ref()) {
            Ok(room) => {
                if room.is_none() {
                    log::info!("Room {:?} is gone", self.room);
                }
                self.view = room;
                true
            }
            Err(err) => {
                log::warn!("Ignoring malformed room update: {}", err);
                false
            }
        }
    }

    fn enter(&mut self, code: RoomCode) -> Result<()> {
        self.subscription = Some(self.store.subscribe(&StorePath::room(&code))?);
        self.room = Some(code);
        self.view = None;
        self.refresh();
        Ok(())
    }
}
