//! Volume fader curve: a monotonic, non-linear mapping between decibels and
//! a normalized fader position, with 0 dB pinned to a fixed reference
//! position. The two directions are exact inverses of each other.

/// Fader position of the 0 dB reference.
pub const UNITY_POSITION: f32 = 0.8;

const SLOPE_DB: f32 = 80.0;

pub fn db_to_fader_position(db: f32) -> f32 {
    UNITY_POSITION * 10.0_f32.powf(db / SLOPE_DB)
}

pub fn fader_position_to_db(position: f32) -> f32 {
    SLOPE_DB * (position / UNITY_POSITION).log10()
}

pub fn fader_position_to_gain(position: f32) -> f32 {
    if position <= 0.0 {
        return 0.0;
    }
    10.0_f32.powf(fader_position_to_db(position) / 20.0)
}
