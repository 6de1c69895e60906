//! Job result types.
//!
//! The result endpoint answers with a document of the form
//!
//! ```json
//! {"status": "finished", "backend_name": "...", "backend_version": "...",
//!  "job_id": "...", "results": [{"header": {"name": "experiment_0"},
//!  "shots": 3, "success": true, "data": {"memory": [...]}}]}
//! ```
//!
//! `memory` holds one entry per shot; each shot holds one frame per
//! wire-group slot (one slot per atomic species); each frame is a list
//! of numbers.

use serde::{Deserialize, Serialize};

use crate::job::JobState;

/// Result document of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Remote status, mapped at the boundary.
    #[serde(rename = "status")]
    pub state: JobState,
    /// Backend that ran the job.
    #[serde(default)]
    pub backend_name: String,
    /// Version of that backend.
    #[serde(default)]
    pub backend_version: String,
    /// Job id echoed by the remote side.
    #[serde(default)]
    pub job_id: String,
    /// One entry per experiment.
    #[serde(default)]
    pub results: Vec<ExperimentResult>,
}

impl JobResult {
    /// Look up the result of one experiment by its label.
    pub fn experiment(&self, label: &str) -> Option<&ExperimentResult> {
        self.results.iter().find(|r| r.name() == label)
    }

    /// Whether the remote side reported the job as done.
    pub fn is_done(&self) -> bool {
        self.state == JobState::Done
    }
}

/// Header of an experiment result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentHeader {
    /// Experiment label, e.g. `experiment_0`.
    #[serde(default)]
    pub name: String,
}

/// Raw measurement data of one experiment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentData {
    /// `memory[shot][slot][value]`.
    #[serde(default)]
    pub memory: Vec<Vec<Vec<f64>>>,
}

/// Result of one experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    #[serde(default)]
    header: ExperimentHeader,
    #[serde(default)]
    shots: u32,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: ExperimentData,
}

impl ExperimentResult {
    /// Create an experiment result.
    pub fn new(name: impl Into<String>, memory: Vec<Vec<Vec<f64>>>) -> Self {
        Self {
            header: ExperimentHeader { name: name.into() },
            shots: u32::try_from(memory.len()).unwrap_or(u32::MAX),
            success: true,
            data: ExperimentData { memory },
        }
    }

    /// Experiment label.
    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// Number of shots reported by the backend.
    pub fn shots(&self) -> u32 {
        self.shots
    }

    /// Whether the backend reports this experiment as successful.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Per-shot memory.
    pub fn memory(&self) -> &[Vec<Vec<f64>>] {
        &self.data.memory
    }

    /// Mean over all shots, per slot and value.
    ///
    /// Shots with fewer slots or values than others simply do not
    /// contribute to the missing positions.
    #[allow(clippy::cast_precision_loss)]
    pub fn slot_means(&self) -> Vec<Vec<f64>> {
        let mut sums: Vec<Vec<(f64, usize)>> = vec![];
        for shot in &self.data.memory {
            for (s, frame) in shot.iter().enumerate() {
                if sums.len() <= s {
                    sums.push(vec![]);
                }
                for (v, value) in frame.iter().enumerate() {
                    if sums[s].len() <= v {
                        sums[s].push((0.0, 0));
                    }
                    sums[s][v].0 += value;
                    sums[s][v].1 += 1;
                }
            }
        }
        sums.into_iter()
            .map(|slot| slot.into_iter().map(|(sum, n)| sum / n as f64).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn mixtures_result() -> serde_json::Value {
        json!({
            "backend_name": "cold_atom_mixtures",
            "backend_version": "0.0.1",
            "job_id": "abc",
            "qobj_id": "1234",
            "success": "true",
            "header": {},
            "status": "finished",
            "results": [{
                "header": {"name": "experiment_0"},
                "shots": 3,
                "success": true,
                "meas_return": "single",
                "meas_level": 1,
                "data": {
                    "memory": [
                        [[90012.0, 9988.0], [5100.0, 4900.0]],
                        [[89900.0, 10100.0], [5000.0, 5000.0]],
                        [[90000.0, 10000.0], [5050.0, 4950.0]]
                    ]
                }
            }]
        })
    }

    #[test]
    fn test_decode_result_document() {
        let result: JobResult = serde_json::from_value(mixtures_result()).unwrap();
        assert!(result.is_done());
        assert_eq!(result.backend_name, "cold_atom_mixtures");
        assert_eq!(result.job_id, "abc");

        let exp = result.experiment("experiment_0").unwrap();
        assert_eq!(exp.shots(), 3);
        assert!(exp.success());
        assert_eq!(exp.memory().len(), 3);
        assert_eq!(exp.memory()[1][1], vec![5000.0, 5000.0]);
        assert!(result.experiment("experiment_1").is_none());
    }

    #[test]
    fn test_slot_means() {
        let result: JobResult = serde_json::from_value(mixtures_result()).unwrap();
        let means = result.results[0].slot_means();
        assert_eq!(means.len(), 2);
        assert!((means[0][0] - 89970.666_666).abs() < 1e-3);
        assert!((means[0][1] - 10029.333_333).abs() < 1e-3);
        assert_eq!(means[1], vec![5050.0, 4950.0]);
    }

    #[test]
    fn test_pending_result_without_results() {
        let result: JobResult =
            serde_json::from_value(json!({"status": "running", "job_id": "abc"})).unwrap();
        assert_eq!(result.state, JobState::Running);
        assert!(result.results.is_empty());
    }

    #[test]
    fn test_empty_memory_has_no_means() {
        assert!(ExperimentResult::new("experiment_0", vec![]).slot_means().is_empty());
    }
}
