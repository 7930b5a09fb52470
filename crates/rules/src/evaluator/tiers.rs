//! G1/G3 derivation from the final G2 goal.

use goalset_core::fields::{is_sentinel, round2, ALL_CONDITIONS_FAILED, G1_GOAL, G2_GOAL, G3_GOAL};
use goalset_core::{FieldValue, Row};

/// Upper and lower tier for a numeric G2 at `bps_threshold` basis points.
/// The lower tier never drops below zero.
pub fn tier_bounds(g2: f64, bps_threshold: f64) -> (f64, f64) {
    let offset = bps_threshold / 100.0;
    let g1 = round2(g2 + offset);
    let g3 = round2(g2 - offset).max(0.0);
    (g1, g3)
}

/// Fill `G1_goal` and `G3_goal` from `G2_goal`.
///
/// Sentinel strings are copied to both tiers unchanged. A G2 that is
/// neither a sentinel nor numeric yields the no-match sentinel on both.
/// Rows without a G2 goal are left alone.
pub fn derive_tiers(row: &mut Row, bps_threshold: f64) {
    let Some(g2) = row.get(G2_GOAL).cloned() else {
        return;
    };

    if let FieldValue::Text(text) = &g2 {
        if is_sentinel(text) {
            row.set(G1_GOAL, text.as_str());
            row.set(G3_GOAL, text.as_str());
            return;
        }
    }

    match g2.as_number() {
        Some(value) => {
            let (g1, g3) = tier_bounds(value, bps_threshold);
            row.set(G1_GOAL, g1);
            row.set(G3_GOAL, g3);
        }
        None => {
            row.set(G1_GOAL, ALL_CONDITIONS_FAILED);
            row.set(G3_GOAL, ALL_CONDITIONS_FAILED);
        }
    }
}
