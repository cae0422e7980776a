use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use serde::{Deserialize, Serialize};

use crate::*;

/// Colors handed out to players in join order.
pub const PLAYER_COLORS: [&str; 8] = [
    "#3B82F6", "#EF4444", "#22C55E", "#F59E0B", "#8B5CF6", "#EC4899", "#06B6D4", "#F97316",
];

/// Color used for names that are not (or no longer) in the room.
pub const UNKNOWN_PLAYER_COLOR: &str = "#666";

/// Length of a room code.
pub const ROOM_CODE_LEN: usize = 6;

const ROOM_CODE_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// How long ephemeral effect records stay visible, in milliseconds.
pub const EFFECT_TTL_MS: u64 = 3_000;

/// Generates a shareable room code. Collisions are not checked.
pub fn generate_room_code<R: rand::Rng>(rng: &mut R) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| char::from(ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())]))
        .collect()
}

/// Shared game phase. `Waiting -> Playing -> {Won, Lost}`, and back to `Waiting` only through a reset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    #[default]
    Waiting,
    Playing,
    Won,
    Lost,
}

impl GamePhase {
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub color: String,
    pub is_host: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageEventKind {
    Damage,
    Defeat,
}

/// Last combat event, replayed by every client as a sound/visual cue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: DamageEventKind,
    pub row: Coord,
    pub col: Coord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<u32>,
    pub timestamp: u64,
}

/// Cosmetic pin highlight broadcast to every client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ripple {
    pub row: Coord,
    pub col: Coord,
    pub color: String,
    pub timestamp: u64,
}

/// The shared room document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(default)]
    pub players: BTreeMap<String, Player>,
    #[serde(default)]
    pub board: Option<Board>,
    #[serde(default)]
    pub game_state: GamePhase,
    #[serde(default)]
    pub mode: ModeId,
    #[serde(default = "first_click_default")]
    pub first_click: bool,
    #[serde(flatten)]
    pub party: Party,
    #[serde(default)]
    pub time: u32,
    #[serde(default)]
    pub timer_running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_event: Option<DamageEvent>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ripples: BTreeMap<String, Ripple>,
    #[serde(default)]
    pub created_at: u64,
}

fn first_click_default() -> bool {
    true
}

impl Room {
    /// A fresh room in the waiting phase with `host` as its only player.
    pub fn new(host: &str, mode: ModeId, config: &ModeConfig, created_at: u64) -> Self {
        let mut players = BTreeMap::new();
        players.insert(
            host.to_string(),
            Player {
                name: host.to_string(),
                color: PLAYER_COLORS[0].to_string(),
                is_host: true,
            },
        );
        Self {
            players,
            board: None,
            game_state: GamePhase::Waiting,
            mode,
            first_click: true,
            party: Party::new(config.hp),
            time: 0,
            timer_running: false,
            damage_event: None,
            ripples: BTreeMap::new(),
            created_at,
        }
    }

    /// Color for the named player, or a neutral color if unknown.
    pub fn color_of(&self, name: &str) -> &str {
        self.players
            .get(name)
            .map_or(UNKNOWN_PLAYER_COLOR, |player| player.color.as_str())
    }

    /// Number of monsters defeated or revealed so far, by the room's policy.
    pub fn monsters_cleared(&self, config: &ModeConfig) -> CellCount {
        self.board.as_ref().map_or(0, |board| {
            board
                .iter()
                .filter(|(_, cell)| cell.is_monster && config.combat.is_cleared(cell))
                .count() as CellCount
        })
    }
}

/// First palette color not used by anyone in `players`, falling back to the first color.
pub fn next_player_color(players: &BTreeMap<String, Player>) -> &'static str {
    PLAYER_COLORS
        .into_iter()
        .find(|color| !players.values().any(|player| player.color == *color))
        .unwrap_or(PLAYER_COLORS[0])
}

/// Adds `name` to `players` with the next free color.
pub fn join_players(players: &mut BTreeMap<String, Player>, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::EmptyName);
    }
    if players.contains_key(name) {
        return Err(GameError::NameTaken);
    }
    let color = next_player_color(players).to_string();
    players.insert(
        name.to_string(),
        Player {
            name: name.to_string(),
            color,
            is_host: false,
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn room() -> Room {
        let mode = ModeId::Easy;
        Room::new("host", mode, &mode.preset(), 0)
    }

    #[test]
    fn new_room_waits_with_host() {
        let room = room();

        assert_eq!(room.game_state, GamePhase::Waiting);
        assert!(room.first_click);
        assert_eq!(room.party, Party::new(10));
        assert!(room.players["host"].is_host);
        assert_eq!(room.color_of("host"), PLAYER_COLORS[0]);
        assert_eq!(room.color_of("ghost"), UNKNOWN_PLAYER_COLOR);
    }

    #[test]
    fn joining_takes_first_unused_color() {
        let mut room = room();

        join_players(&mut room.players, "b").unwrap();
        join_players(&mut room.players, "c").unwrap();
        room.players.remove("b");
        join_players(&mut room.players, "d").unwrap();

        assert_eq!(room.players["c"].color, PLAYER_COLORS[2]);
        assert_eq!(room.players["d"].color, PLAYER_COLORS[1]);
        assert!(!room.players["d"].is_host);
    }

    #[test]
    fn full_palette_falls_back_to_first_color() {
        let mut room = room();
        for name in ["a", "b", "c", "d", "e", "f", "g"] {
            join_players(&mut room.players, name).unwrap();
        }

        join_players(&mut room.players, "extra").unwrap();

        assert_eq!(room.players["extra"].color, PLAYER_COLORS[0]);
    }

    #[test]
    fn join_rejects_empty_and_duplicate_names() {
        let mut room = room();

        assert_eq!(join_players(&mut room.players, "  "), Err(GameError::EmptyName));
        assert_eq!(join_players(&mut room.players, "host"), Err(GameError::NameTaken));
    }

    #[test]
    fn room_codes_are_uppercase_alphanumeric() {
        let mut rng = SmallRng::seed_from_u64(4);
        for _ in 0..50 {
            let code = generate_room_code(&mut rng);
            assert_eq!(code.len(), ROOM_CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn document_shape_uses_camel_case() {
        let mut room = room();
        room.damage_event = Some(DamageEvent {
            id: 7,
            kind: DamageEventKind::Defeat,
            row: 1,
            col: 2,
            damage: None,
            timestamp: 7,
        });

        let value = serde_json::to_value(&room).unwrap();

        assert_eq!(value["gameState"], "waiting");
        assert_eq!(value["mode"], "easy");
        assert_eq!(value["maxHp"], 10);
        assert_eq!(value["firstClick"], true);
        assert_eq!(value["timerRunning"], false);
        assert_eq!(value["damageEvent"]["type"], "defeat");
        assert!(value["damageEvent"].get("damage").is_none());
        assert!(value["board"].is_null());
        assert_eq!(value["players"]["host"]["isHost"], true);

        let back: Room = serde_json::from_value(value).unwrap();
        assert_eq!(back, room);
    }

    #[test]
    fn sparse_document_fills_defaults() {
        let value = serde_json::json!({
            "gameState": "playing",
            "mode": "huge",
            "hp": 3,
            "maxHp": 30,
            "level": 2,
            "exp": 12,
        });

        let room: Room = serde_json::from_value(value).unwrap();

        assert!(room.players.is_empty());
        assert!(room.board.is_none());
        assert!(room.first_click);
        assert_eq!(room.party.level, 2);
    }
}
