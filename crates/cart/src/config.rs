//! Cart configuration.
//!
//! Defaults reproduce the storefront's historical behavior: unknown ids are
//! ignored and decrements are not floored. Stricter behavior is opt-in.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Storage key the cart is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "@GoMarketplace:products";

pub const ENV_STORAGE_KEY: &str = "GOMARKETPLACE_CART_KEY";
pub const ENV_UNKNOWN_ID: &str = "GOMARKETPLACE_UNKNOWN_ID";
pub const ENV_DECREMENT_FLOOR: &str = "GOMARKETPLACE_DECREMENT_FLOOR";

/// What `increment`/`decrement` do when the id is not in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownIdPolicy {
    /// Leave the cart unchanged but still publish and persist it.
    #[default]
    Ignore,
    /// Fail with `DomainError::NotFound`; nothing is published or persisted.
    Reject,
}

impl FromStr for UnknownIdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown id policy '{other}' (expected ignore|reject)")),
        }
    }
}

/// Lower bound applied by `decrement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecrementFloor {
    /// No floor: quantity may reach zero or go negative.
    #[default]
    #[serde(rename = "none")]
    Unclamped,
    /// Decrementing an entry whose quantity is `<= 1` does nothing at all.
    #[serde(rename = "one")]
    KeepAtOne,
}

impl FromStr for DecrementFloor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::Unclamped),
            "one" => Ok(Self::KeepAtOne),
            other => Err(format!("unknown decrement floor '{other}' (expected none|one)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartConfig {
    pub storage_key: String,
    #[serde(default)]
    pub unknown_id_policy: UnknownIdPolicy,
    #[serde(default)]
    pub decrement_floor: DecrementFloor,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            unknown_id_policy: UnknownIdPolicy::default(),
            decrement_floor: DecrementFloor::default(),
        }
    }
}

impl CartConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_unknown_id_policy(mut self, policy: UnknownIdPolicy) -> Self {
        self.unknown_id_policy = policy;
        self
    }

    pub fn with_decrement_floor(mut self, floor: DecrementFloor) -> Self {
        self.decrement_floor = floor;
        self
    }

    /// Load configuration from the process environment.
    ///
    /// Unset variables keep their defaults; unparseable values are logged and
    /// ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`CartConfig::from_env`] but reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(key) = lookup(ENV_STORAGE_KEY).filter(|k| !k.trim().is_empty()) {
            config.storage_key = key;
        }

        if let Some(raw) = lookup(ENV_UNKNOWN_ID) {
            match raw.parse() {
                Ok(policy) => config.unknown_id_policy = policy,
                Err(err) => tracing::warn!("{ENV_UNKNOWN_ID} ignored: {err}"),
            }
        }

        if let Some(raw) = lookup(ENV_DECREMENT_FLOOR) {
            match raw.parse() {
                Ok(floor) => config.decrement_floor = floor,
                Err(err) => tracing::warn!("{ENV_DECREMENT_FLOOR} ignored: {err}"),
            }
        }

        config
    }
}
