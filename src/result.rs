//! Result types: the per-layer report shape and the top-level
//! [`AnalysisResult`] bundle, matching the teacher's habit of keeping
//! result structs `serde`-derivable and free of behavior.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use uuid::Uuid;

/// A single detail value: integer, real, or text. Serializes untagged so
/// JSON output carries flat scalars instead of `{"Real": 1.0}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Serialize for Detail {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Detail::Integer(v) => serializer.serialize_i64(*v),
            Detail::Real(v) => serializer.serialize_f64(crate::numeric::finite_or_zero(*v)),
            Detail::Text(v) => serializer.serialize_str(v),
        }
    }
}

impl From<i64> for Detail {
    fn from(v: i64) -> Self {
        Detail::Integer(v)
    }
}

impl From<f64> for Detail {
    fn from(v: f64) -> Self {
        Detail::Real(v)
    }
}

impl From<&str> for Detail {
    fn from(v: &str) -> Self {
        Detail::Text(v.to_string())
    }
}

impl From<String> for Detail {
    fn from(v: String) -> Self {
        Detail::Text(v)
    }
}

/// Round a confidence value to two decimals at serialize time, matching
/// the external JSON contract without touching the stored precision used
/// internally (tests compare against unrounded computed values).
fn serialize_confidence<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(crate::numeric::round_to(crate::numeric::finite_or_zero(*value), 2))
}

/// Round the overall score to one decimal at serialize time.
fn serialize_overall_score<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(crate::numeric::round_to(crate::numeric::finite_or_zero(*value), 1))
}

/// Round elapsed processing time to three decimals at serialize time.
fn serialize_processing_time<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(crate::numeric::round_to(crate::numeric::finite_or_zero(*value), 3))
}

/// One layer's verdict contribution: a clamped integer score, a bounded
/// confidence, ordered findings, and a bag of numeric/text details.
#[derive(Debug, Clone, Serialize)]
pub struct LayerReport {
    pub name: String,
    pub score: i64,
    #[serde(serialize_with = "serialize_confidence")]
    pub confidence: f64,
    pub findings: Vec<String>,
    pub details: BTreeMap<String, Detail>,
}

/// Accumulates additive penalties and findings for a single layer, then
/// freezes into a [`LayerReport`]. Mirrors the teacher's
/// score-plus-findings-list accumulation pattern in `analyzer.rs`.
pub struct LayerBuilder {
    name: &'static str,
    score: i64,
    findings: Vec<String>,
    details: BTreeMap<String, Detail>,
}

impl LayerBuilder {
    pub fn new(name: &'static str) -> Self {
        LayerBuilder {
            name,
            score: 0,
            findings: Vec::new(),
            details: BTreeMap::new(),
        }
    }

    pub fn penalize(&mut self, amount: i64, finding: impl Into<String>) {
        self.score += amount;
        self.findings.push(finding.into());
    }

    pub fn note(&mut self, finding: impl Into<String>) {
        self.findings.push(finding.into());
    }

    pub fn detail(&mut self, key: &str, value: impl Into<Detail>) {
        self.details.insert(key.to_string(), value.into());
    }

    /// Raw accumulated score before clamping, for callers that need to
    /// branch on "no penalty has fired yet".
    pub fn current_score(&self) -> i64 {
        self.score
    }

    pub fn finish(mut self, confidence_ceiling: f64, confidence_base: f64, confidence_scale: f64) -> LayerReport {
        let clamped_score = self.score.clamp(0, 100);
        if self.findings.is_empty() {
            self.findings.push("No findings".to_string());
        }
        let confidence = (confidence_base + clamped_score as f64 / confidence_scale).min(confidence_ceiling);
        LayerReport {
            name: self.name.to_string(),
            score: clamped_score,
            confidence,
            findings: self.findings,
            details: self.details,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerReports {
    pub digital_footprint: LayerReport,
    pub pixel_physics: LayerReport,
    pub lighting_geometry: LayerReport,
    pub semantic_analysis: LayerReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub filename: String,
    pub declared_format: Option<String>,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub file_size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub file_info: FileInfo,
    pub analysis_timestamp: chrono::DateTime<chrono::Utc>,
    pub engine_version: &'static str,
}

/// Categorical verdict derived from `overall_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Real,
    Suspicious,
    Edited,
    Fake,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub verdict: Verdict,
    #[serde(serialize_with = "serialize_confidence")]
    pub confidence: f64,
    #[serde(serialize_with = "serialize_overall_score")]
    pub overall_score: f64,
    #[serde(serialize_with = "serialize_processing_time")]
    pub processing_time_seconds: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub layers: LayerReports,
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_report_confidence_is_rounded_to_two_decimals_in_json() {
        let report = LayerReport {
            name: "digital_footprint".to_string(),
            score: 45,
            confidence: 0.8253,
            findings: vec!["x".to_string()],
            details: BTreeMap::new(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["confidence"], serde_json::json!(0.83));
        // The unrounded value is preserved on the Rust struct itself.
        assert_eq!(report.confidence, 0.8253);
    }
}
