//! Fusion: combines the four layer scores into an overall score and
//! verdict under a consensus-tempering rule.

use crate::result::Verdict;

const WEIGHT_L1: f64 = 0.10;
const WEIGHT_L2: f64 = 0.30;
const WEIGHT_L3: f64 = 0.20;
const WEIGHT_L4: f64 = 0.40;
const AGREEMENT_THRESHOLD: i64 = 45;

pub struct FusionOutput {
    pub overall_score: f64,
    pub verdict: Verdict,
    pub confidence: f64,
}

/// Count how many of the four layer scores meet or exceed the
/// agreement threshold, then pick the consensus-tempering multiplier
/// that count implies.
fn agreement_multiplier(scores: [i64; 4]) -> f64 {
    let agreement = scores.iter().filter(|&&s| s >= AGREEMENT_THRESHOLD).count();
    match agreement {
        0 | 1 => 0.55,
        2 => 0.75,
        _ => 0.90,
    }
}

fn verdict_for(score: f64) -> Verdict {
    if score >= 70.0 {
        Verdict::Fake
    } else if score >= 55.0 {
        Verdict::Edited
    } else if score >= 40.0 {
        Verdict::Suspicious
    } else {
        Verdict::Real
    }
}

pub fn fuse(s1: i64, s2: i64, s3: i64, s4: i64) -> FusionOutput {
    let raw = WEIGHT_L1 * s1 as f64 + WEIGHT_L2 * s2 as f64 + WEIGHT_L3 * s3 as f64 + WEIGHT_L4 * s4 as f64;
    let multiplier = agreement_multiplier([s1, s2, s3, s4]);
    let overall_score = (raw * multiplier).clamp(0.0, 100.0);
    let verdict = verdict_for(overall_score);
    let confidence = (0.5 + (overall_score - 50.0).abs() / 120.0).min(0.9);

    FusionOutput {
        overall_score,
        verdict,
        confidence,
    }
}
