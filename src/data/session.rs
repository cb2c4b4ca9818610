use chrono::{DateTime, Utc};

use super::model::{AgingStep, Measurement, Metadata, SpectroscopyType};

/// A whole experiment: every measurement taken over the aging series.
#[derive(Debug, Clone, Default)]
pub struct ExperimentSession {
    pub session_id: String,
    pub measurements: Vec<Measurement>,
    pub experiment_config: Option<Metadata>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl ExperimentSession {
    pub fn new(session_id: impl Into<String>, measurements: Vec<Measurement>) -> Self {
        Self {
            session_id: session_id.into(),
            measurements,
            ..Default::default()
        }
    }

    pub fn measurement_count(&self) -> usize {
        self.measurements.len()
    }

    pub fn measurements_by_aging_step(&self, step: AgingStep) -> Vec<&Measurement> {
        self.measurements
            .iter()
            .filter(|m| m.aging_step() == step)
            .collect()
    }

    pub fn measurements_by_type(&self, spectroscopy_type: SpectroscopyType) -> Vec<&Measurement> {
        self.measurements
            .iter()
            .filter(|m| m.spectroscopy_type() == spectroscopy_type)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{SpectralData, Spectrum};

    fn measurement(id: &str, step: AgingStep, ty: SpectroscopyType) -> Measurement {
        let data = SpectralData::new(vec![400.0, 410.0], vec![0.1, 0.2], ty).unwrap();
        Measurement::new(id, step, ty, vec![Spectrum::new(data, "spectrum_0")]).unwrap()
    }

    #[test]
    fn test_session_queries() {
        let session = ExperimentSession::new(
            "aging-2023",
            vec![
                measurement("a", AgingStep::Step0, SpectroscopyType::Fluorescence),
                measurement("b", AgingStep::Step3, SpectroscopyType::Absorption),
                measurement("c", AgingStep::Step3, SpectroscopyType::Fluorescence),
            ],
        );

        assert_eq!(session.measurement_count(), 3);

        let step3: Vec<&str> = session
            .measurements_by_aging_step(AgingStep::Step3)
            .iter()
            .map(|m| m.measurement_id())
            .collect();
        assert_eq!(step3, vec!["b", "c"]);

        assert_eq!(
            session
                .measurements_by_type(SpectroscopyType::Fluorescence)
                .len(),
            2
        );
        assert!(session
            .measurements_by_type(SpectroscopyType::Raman)
            .is_empty());
        assert!(session.start_time.is_none());
    }
}
