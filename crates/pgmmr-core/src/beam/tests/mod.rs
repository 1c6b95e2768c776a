mod basic;

use crate::mmr::MuteK;
use crate::settings::{BeamConfig, DiversityConfig, SearchConfig};

/// Settings with diversity scoring switched off.
pub(super) fn plain_config(beam_width: usize, max: usize, min: usize) -> BeamConfig {
    BeamConfig {
        search: SearchConfig {
            beam_width,
            max_decode_steps: max,
            min_decode_steps: min,
        },
        diversity: DiversityConfig {
            enabled: false,
            lambda: 0.6,
            mute_k: MuteK::Unbounded,
            retain_values: false,
        },
    }
}

pub(super) fn diverse_config(
    beam_width: usize,
    max: usize,
    min: usize,
    lambda: f32,
    mute_k: MuteK,
    retain_values: bool,
) -> BeamConfig {
    let mut config = plain_config(beam_width, max, min);
    config.diversity = DiversityConfig {
        enabled: true,
        lambda,
        mute_k,
        retain_values,
    };
    config
}
