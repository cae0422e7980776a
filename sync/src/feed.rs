use mamono_core::{DamageEvent, Room};

/// Per-client filter that turns the shared `damageEvent` slot into a stream of fresh, unseen cues.
#[derive(Clone, Debug, Default)]
pub struct EffectFeed {
    last_seen: Option<u64>,
    ttl_ms: u64,
}

impl EffectFeed {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            last_seen: None,
            ttl_ms,
        }
    }

    /// Returns the room's damage event if it is recent and has not been handed out before.
    pub fn poll(&mut self, room: &Room, now_ms: u64) -> Option<DamageEvent> {
        let event = room.damage_event.as_ref()?;
        if self.last_seen == Some(event.id) {
            return None;
        }
        self.last_seen = Some(event.id);
        if now_ms.saturating_sub(event.timestamp) >= self.ttl_ms {
            log::trace!("Skipping stale damage event {}", event.id);
            return None;
        }
        Some(event.clone())
    }

    /// Ripples still inside the display window, as `(row, col, color)`.
    pub fn ripples<'a>(&self, room: &'a Room, now_ms: u64) -> Vec<(u8, u8, &'a str)> {
        room.ripples
            .values()
            .filter(|ripple| now_ms.saturating_sub(ripple.timestamp) < self.ttl_ms)
            .map(|ripple| (ripple.row, ripple.col, ripple.color.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mamono_core::{DamageEventKind, ModeId, Ripple};

    fn room_with_event(id: u64, timestamp: u64) -> Room {
        let mode = ModeId::Easy;
        let mut room = Room::new("host", mode, &mode.preset(), 0);
        room.damage_event = Some(DamageEvent {
            id,
            kind: DamageEventKind::Damage,
            row: 1,
            col: 1,
            damage: Some(2),
            timestamp,
        });
        room
    }

    #[test]
    fn each_event_is_handed_out_once() {
        let mut feed = EffectFeed::new(3_000);
        let room = room_with_event(7, 10_000);

        assert_eq!(feed.poll(&room, 10_500).map(|e| e.id), Some(7));
        assert_eq!(feed.poll(&room, 10_600), None);
        assert_eq!(feed.poll(&room_with_event(8, 10_700), 10_800).map(|e| e.id), Some(8));
    }

    #[test]
    fn stale_events_and_ripples_are_hidden() {
        let mut feed = EffectFeed::new(3_000);
        let mut room = room_with_event(1, 0);
        room.ripples.insert(
            "old".into(),
            Ripple {
                row: 0,
                col: 0,
                color: "#4ECDC4".into(),
                timestamp: 0,
            },
        );
        room.ripples.insert(
            "new".into(),
            Ripple {
                row: 4,
                col: 5,
                color: "#45B7D1".into(),
                timestamp: 2_500,
            },
        );

        assert_eq!(feed.poll(&room, 3_000), None);
        assert_eq!(feed.ripples(&room, 3_000), [(4, 5, "#45B7D1")]);
    }
}
