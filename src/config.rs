//! Runtime configuration parameters.
//!
//! Table capacities are fixed at build time through const generics on
//! [`Reactor`](crate::reactor::Reactor); everything tunable at setup lives
//! here. The struct is serde-serializable so a board can ship it in flash
//! or receive it from a provisioning tool.

use serde::{Deserialize, Serialize};

use crate::drivers::button::ActiveLevel;
use crate::error::{Error, Result};
use crate::time::Ticks;

/// Maximum zones a single analog channel can classify into.
pub const MAX_ZONES_PER_CHANNEL: usize = 8;

/// Core reactor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactorConfig {
    /// Minimum ticks between accepted edges on a digital input.
    pub debounce_ms: Ticks,
    /// Minimum ticks between accepted rotation steps on an encoder.
    pub encoder_debounce_ms: Ticks,
    /// Active level used by [`Reactor::new_input`](crate::reactor::Reactor::new_input)
    /// callers that do not care (`ActiveLevel::PullUp` is the common
    /// momentary switch to ground).
    pub default_input_level: ActiveLevel,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            encoder_debounce_ms: 5,
            default_input_level: ActiveLevel::PullUp,
        }
    }
}

impl ReactorConfig {
    /// Reject inconsistent windows.
    pub fn validate(&self) -> Result<()> {
        if self.debounce_ms == 0 {
            return Err(Error::Config("debounce window must be non-zero"));
        }
        if self.encoder_debounce_ms > self.debounce_ms {
            return Err(Error::Config(
                "encoder debounce must not exceed button debounce",
            ));
        }
        Ok(())
    }

    /// Parse a JSON document from a provisioning tool. Missing fields are
    /// an error; the result is validated before it is returned.
    pub fn from_json(json: &[u8]) -> Result<Self> {
        let config: Self =
            serde_json::from_slice(json).map_err(|_| Error::Config("malformed config json"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|_| Error::Config("config not encodable as json"))
    }

    /// Compact blob for flash storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| Error::Config("config not encodable"))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let config: Self =
            postcard::from_bytes(bytes).map_err(|_| Error::Config("corrupted config blob"))?;
        config.validate()?;
        Ok(config)
    }
}
