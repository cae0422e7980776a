use serde::{Deserialize, Serialize};

/// Hold time after which a press clears the mark instead of cycling it.
pub const DEFAULT_LONG_PRESS_MS: u64 = 300;
/// Delay between the two ripples sent when pinning.
pub const DEFAULT_RIPPLE_ECHO_DELAY_MS: u64 = 1_000;

/// Client-local tuning; never shared through the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientConfig {
    pub long_press_ms: u64,
    pub ripple_echo_delay_ms: u64,
    /// How long ripples and damage events stay visible, and when written ripples are deleted.
    pub effect_ttl_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            long_press_ms: DEFAULT_LONG_PRESS_MS,
            ripple_echo_delay_ms: DEFAULT_RIPPLE_ECHO_DELAY_MS,
            effect_ttl_ms: mamono_core::EFFECT_TTL_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{ "long-press-ms": 500 }"#).unwrap();
        assert_eq!(config.long_press_ms, 500);
        assert_eq!(config.ripple_echo_delay_ms, DEFAULT_RIPPLE_ECHO_DELAY_MS);
        assert_eq!(config.effect_ttl_ms, 3_000);
    }
}
