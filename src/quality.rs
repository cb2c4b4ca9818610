//! Olive-oil quality scoring.
//!
//! Chemical indicators are mapped to 0–100 sub-scores with a piecewise-linear
//! curve, sensory scores are taken as-is, and the mean of whatever is present
//! decides the grade.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::model::Spectrum;

// ---------------------------------------------------------------------------
// Grades and indicators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    ExtraVirgin,
    Virgin,
    Lampante,
    Refined,
    Unknown,
}

impl QualityGrade {
    /// Position in the grade hierarchy; higher is better.
    pub fn rank(&self) -> u8 {
        match self {
            Self::ExtraVirgin => 4,
            Self::Virgin => 3,
            Self::Lampante => 2,
            Self::Refined => 1,
            Self::Unknown => 0,
        }
    }

    /// Grade for an overall score.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::ExtraVirgin
        } else if score >= 80.0 {
            Self::Virgin
        } else if score >= 60.0 {
            Self::Lampante
        } else {
            Self::Refined
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtraVirgin => "extra_virgin",
            Self::Virgin => "virgin",
            Self::Lampante => "lampante",
            Self::Refined => "refined",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIndicator {
    Acidity,
    PeroxideValue,
    K232,
    K270,
    DeltaK,
    Flavor,
    Aroma,
}

impl QualityIndicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acidity => "acidity",
            Self::PeroxideValue => "peroxide_value",
            Self::K232 => "k232",
            Self::K270 => "k270",
            Self::DeltaK => "delta_k",
            Self::Flavor => "flavor",
            Self::Aroma => "aroma",
        }
    }
}

impl fmt::Display for QualityIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Sub-score curve
// ---------------------------------------------------------------------------

/// Limit for extra virgin grade and penalty slope once it is exceeded.
struct ScoreCurve {
    limit: f64,
    rate: f64,
}

impl ScoreCurve {
    /// 100 at zero, 80 at the limit, then down by `rate` per unit, floored at 0.
    fn score(&self, value: f64) -> f64 {
        if value <= self.limit {
            100.0 - (value / self.limit) * 20.0
        } else {
            (80.0 - (value - self.limit) * self.rate).max(0.0)
        }
    }
}

const ACIDITY: ScoreCurve = ScoreCurve { limit: 0.8, rate: 50.0 };
const PEROXIDE_VALUE: ScoreCurve = ScoreCurve { limit: 20.0, rate: 2.0 };
const K232: ScoreCurve = ScoreCurve { limit: 2.5, rate: 20.0 };
const K270: ScoreCurve = ScoreCurve { limit: 0.22, rate: 200.0 };

// ---------------------------------------------------------------------------
// QualityMetrics
// ---------------------------------------------------------------------------

/// Measured chemical and sensory indicators of one oil sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Free fatty acids (% oleic acid).
    pub acidity: Option<f64>,
    /// meq O2/kg.
    pub peroxide_value: Option<f64>,
    pub k232: Option<f64>,
    pub k270: Option<f64>,
    pub delta_k: Option<f64>,
    /// Sensory panel score, 0–100.
    pub flavor: Option<f64>,
    /// Sensory panel score, 0–100.
    pub aroma: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl QualityMetrics {
    /// Sub-score of every indicator that contributes and is present.
    /// `delta_k` never contributes.
    pub fn sub_scores(&self) -> BTreeMap<QualityIndicator, f64> {
        let chemical = [
            (QualityIndicator::Acidity, self.acidity, &ACIDITY),
            (QualityIndicator::PeroxideValue, self.peroxide_value, &PEROXIDE_VALUE),
            (QualityIndicator::K232, self.k232, &K232),
            (QualityIndicator::K270, self.k270, &K270),
        ];

        let mut scores: BTreeMap<QualityIndicator, f64> = chemical
            .into_iter()
            .filter_map(|(indicator, value, curve)| value.map(|v| (indicator, curve.score(v))))
            .collect();

        if let Some(flavor) = self.flavor {
            scores.insert(QualityIndicator::Flavor, flavor);
        }
        if let Some(aroma) = self.aroma {
            scores.insert(QualityIndicator::Aroma, aroma);
        }
        scores
    }

    /// Mean of the present sub-scores, `0.0` when nothing was measured.
    pub fn overall_score(&self) -> f64 {
        let scores = self.sub_scores();
        if scores.is_empty() {
            return 0.0;
        }
        scores.values().sum::<f64>() / scores.len() as f64
    }

    pub fn grade(&self) -> QualityGrade {
        QualityGrade::from_score(self.overall_score())
    }
}

// ---------------------------------------------------------------------------
// QualityThreshold
// ---------------------------------------------------------------------------

/// Regulatory bounds an oil must meet to carry a grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityThreshold {
    pub grade: QualityGrade,
    pub max_acidity: f64,
    pub max_peroxide_value: f64,
    pub max_k232: f64,
    pub max_k270: f64,
    pub min_flavor: f64,
    pub min_aroma: f64,
}

impl QualityThreshold {
    /// Chemical limits of EU Reg. 2568/91 for extra virgin oil.
    pub fn extra_virgin() -> Self {
        Self {
            grade: QualityGrade::ExtraVirgin,
            max_acidity: 0.8,
            max_peroxide_value: 20.0,
            max_k232: 2.5,
            max_k270: 0.22,
            min_flavor: 90.0,
            min_aroma: 90.0,
        }
    }

    /// Chemical limits of EU Reg. 2568/91 for virgin oil.
    pub fn virgin() -> Self {
        Self {
            grade: QualityGrade::Virgin,
            max_acidity: 2.0,
            max_peroxide_value: 20.0,
            max_k232: 2.6,
            max_k270: 0.25,
            min_flavor: 80.0,
            min_aroma: 80.0,
        }
    }

    /// Pass/fail per indicator present in `metrics`. `delta_k` has no bound
    /// and is never reported.
    pub fn check_compliance(&self, metrics: &QualityMetrics) -> BTreeMap<QualityIndicator, bool> {
        let checks = [
            (QualityIndicator::Acidity, metrics.acidity.map(|v| v <= self.max_acidity)),
            (
                QualityIndicator::PeroxideValue,
                metrics.peroxide_value.map(|v| v <= self.max_peroxide_value),
            ),
            (QualityIndicator::K232, metrics.k232.map(|v| v <= self.max_k232)),
            (QualityIndicator::K270, metrics.k270.map(|v| v <= self.max_k270)),
            (QualityIndicator::Flavor, metrics.flavor.map(|v| v >= self.min_flavor)),
            (QualityIndicator::Aroma, metrics.aroma.map(|v| v >= self.min_aroma)),
        ];

        checks
            .into_iter()
            .filter_map(|(indicator, ok)| ok.map(|ok| (indicator, ok)))
            .collect()
    }

    /// Whether every present indicator is within bounds.
    pub fn is_compliant(&self, metrics: &QualityMetrics) -> bool {
        self.check_compliance(metrics).values().all(|ok| *ok)
    }
}

// ---------------------------------------------------------------------------
// SpectralQualityAssessment
// ---------------------------------------------------------------------------

/// A grade assigned to a spectrum, with the metrics it was derived from.
#[derive(Debug, Clone)]
pub struct SpectralQualityAssessment {
    pub spectrum: Spectrum,
    pub quality_metrics: QualityMetrics,
    pub quality_grade: QualityGrade,
    pub spectral_features: Option<BTreeMap<String, f64>>,
    pub assessment_confidence: Option<f64>,
    pub assessment_method: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl SpectralQualityAssessment {
    /// Assessment graded from the metrics themselves.
    pub fn from_metrics(spectrum: Spectrum, quality_metrics: QualityMetrics) -> Self {
        let quality_grade = quality_metrics.grade();
        Self {
            spectrum,
            quality_metrics,
            quality_grade,
            spectral_features: None,
            assessment_confidence: None,
            assessment_method: None,
            timestamp: None,
        }
    }

    pub fn is_acceptable_quality(&self, min_grade: QualityGrade) -> bool {
        self.quality_grade.rank() >= min_grade.rank()
    }

    /// [`is_acceptable_quality`](Self::is_acceptable_quality) against virgin grade.
    pub fn is_acceptable(&self) -> bool {
        self.is_acceptable_quality(QualityGrade::Virgin)
    }
}
