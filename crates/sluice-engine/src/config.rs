//! Engine configuration.
//!
//! Provides [`EngineConfig`] with defaults and presets for the two engine
//! flavours. The configuration can be built programmatically or loaded from
//! JSON; missing fields take their defaults, unknown fields are rejected.

use serde::{Deserialize, Serialize};

use sluice_core::error::SluiceError;
use sluice_core::types::{Address, CurveParams};
use sluice_curve::Curve;

/// Lower bound on a new stream's start height relative to the current height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPolicy {
    /// `start_height >= current_height`: a stream may start in the creating block.
    #[default]
    AllowCurrent,
    /// `start_height > current_height`: a stream must start in a later block.
    StrictlyFuture,
}

impl StartPolicy {
    /// Whether a stream starting at `start` may be created at `current`.
    pub fn permits(&self, start: u64, current: u64) -> bool {
        match self {
            Self::AllowCurrent => start >= current,
            Self::StrictlyFuture => start > current,
        }
    }
}

/// Configuration for a stream engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// The engine's own identity; also its custody account in the ledger.
    pub engine_address: Address,
    /// Lower bound on start heights at creation.
    pub start_policy: StartPolicy,
    /// Release curve copied into every stream this engine creates.
    pub curve: CurveParams,
    /// When set, streams may only be created in this token.
    pub accepted_token: Option<Address>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_address: Address::ZERO,
            start_policy: StartPolicy::default(),
            curve: CurveParams::Linear,
            accepted_token: None,
        }
    }
}

impl EngineConfig {
    /// Preset for a linear engine accepting any token.
    pub fn linear(engine_address: Address) -> Self {
        Self {
            engine_address,
            ..Self::default()
        }
    }

    /// Preset for a half-life engine bound to a single token.
    pub fn half_life(engine_address: Address, token: Address) -> Self {
        Self {
            engine_address,
            curve: CurveParams::half_life(),
            accepted_token: Some(token),
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, SluiceError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SluiceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration and build its release curve.
    pub fn validate(&self) -> Result<Curve, SluiceError> {
        if self.engine_address.is_zero() {
            return Err(SluiceError::Config("engine_address must be non-zero".into()));
        }
        if self.accepted_token.is_some_and(|t| t.is_zero()) {
            return Err(SluiceError::Config("accepted_token must be non-zero".into()));
        }
        Ok(Curve::try_from(self.curve)?)
    }

    /// Whether streams in `token` may be created.
    pub fn accepts(&self, token: &Address) -> bool {
        self.accepted_token.is_none_or(|t| t == *token)
    }
}
