use std::process;

use pgmmr_core::mmr::{MuteK, SourceGate};

/// Parse `k` the way settings do (`-1` keeps every sentence) and gate
/// `scores`.
pub fn gate_scores(scores: &[f32], k: i64, retain_values: bool) -> Result<Vec<f32>, String> {
    let mute_k = MuteK::try_from(k)?;
    let gate = SourceGate {
        mute_k,
        retain_values,
    };
    Ok(gate.apply(scores))
}

pub fn gate_cmd(scores: &[f32], k: i64, retain_values: bool) {
    let gated = gate_scores(scores, k, retain_values).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });
    let cells: Vec<String> = gated.iter().map(|v| v.to_string()).collect();
    println!("{}", cells.join(" "));
}
