use mamono_core::Coord2;

/// Tracks a held secondary press so that holding it long enough turns into "clear mark".
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LongPress {
    held: Option<Held>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Held {
    coords: Coord2,
    since_ms: u64,
}

impl LongPress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a press, replacing any earlier one.
    pub fn press(&mut self, coords: Coord2, now_ms: u64) {
        self.held = Some(Held {
            coords,
            since_ms: now_ms,
        });
    }

    /// Ends the press early. Returns whether a clear was still pending.
    pub fn release(&mut self) -> bool {
        self.held.take().is_some()
    }

    /// Fires once the press has been held for `threshold_ms`, yielding the cell to clear.
    pub fn poll(&mut self, now_ms: u64, threshold_ms: u64) -> Option<Coord2> {
        let held = self.held?;
        if now_ms.saturating_sub(held.since_ms) < threshold_ms {
            return None;
        }
        self.held = None;
        Some(held.coords)
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }
}
