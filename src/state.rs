//! Persisted configuration for inserts and aux sends.
//!
//! Restored state may come from older sessions with fields missing, so every
//! field carries a default. Device capabilities are always recomputed from
//! the live catalogs, never persisted.

use crate::fader::db_to_fader_position;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InsertState {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub input_device: String,
    #[serde(default)]
    pub output_device: String,
    #[serde(default)]
    pub manual_adjust_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxSendState {
    #[serde(default)]
    pub bus_number: usize,
    #[serde(default = "unity_fader_position")]
    pub gain_fader_position: f32,
    #[serde(default)]
    pub last_volume_before_mute_db: f32,
    #[serde(default)]
    pub bus_name: Option<String>,
}

fn unity_fader_position() -> f32 {
    db_to_fader_position(0.0)
}

impl Default for AuxSendState {
    fn default() -> Self {
        Self {
            bus_number: 0,
            gain_fader_position: unity_fader_position(),
            last_volume_before_mute_db: 0.0,
            bus_name: None,
        }
    }
}
