//! Circuit-to-payload translation.
//!
//! [`translate`] turns a batch of circuits into a [`SubmissionPayload`]:
//!
//! ```text
//!   batch limits ──→ per circuit: resolve wires ──→ validate ──→ CircuitPayload
//!   (experiments,                 (global index)    (fail-fast)
//!    shots)
//! ```
//!
//! Operands are resolved to global wire indices by concatenating the
//! circuit's registers in declaration order. Experiments are keyed
//! `experiment_0`, `experiment_1`, ... in input order; the result decoding
//! path relies on the same labels.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::capability::BackendCapabilities;
use crate::circuit::{Circuit, Wire};
use crate::error::{ColdAtomError, ColdAtomResult};
use crate::validator::InstructionValidator;

/// Prefix of the positional experiment labels.
const EXPERIMENT_PREFIX: &str = "experiment_";

/// Label of the experiment at `index`.
pub fn experiment_label(index: usize) -> String {
    format!("{EXPERIMENT_PREFIX}{index}")
}

/// A translated instruction: name, global wire indices, numeric parameters.
///
/// Serializes as the JSON triple `[name, wires, params]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "(String, Vec<u32>, Vec<f64>)",
    into = "(String, Vec<u32>, Vec<f64>)"
)]
pub struct Instruction {
    /// Instruction name.
    pub name: String,
    /// Global wire indices, in operand order.
    pub wires: Vec<u32>,
    /// Numeric parameters, in order.
    pub params: Vec<f64>,
}

impl Instruction {
    /// Create an instruction.
    pub fn new(name: impl Into<String>, wires: Vec<u32>, params: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            wires,
            params,
        }
    }
}

impl From<(String, Vec<u32>, Vec<f64>)> for Instruction {
    fn from((name, wires, params): (String, Vec<u32>, Vec<f64>)) -> Self {
        Self {
            name,
            wires,
            params,
        }
    }
}

impl From<Instruction> for (String, Vec<u32>, Vec<f64>) {
    fn from(inst: Instruction) -> Self {
        (inst.name, inst.wires, inst.params)
    }
}

/// One translated circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitPayload {
    /// Instructions in authoring order.
    pub instructions: Vec<Instruction>,
    /// Shots for this experiment.
    pub shots: u32,
    /// Total declared wires of the circuit.
    pub num_wires: u32,
}

/// A batch of translated circuits, keyed by positional experiment label.
///
/// Serializes as a JSON object `{"experiment_0": {...}, ...}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionPayload {
    experiments: Vec<CircuitPayload>,
}

impl SubmissionPayload {
    /// Create a payload from experiments in submission order.
    pub fn new(experiments: Vec<CircuitPayload>) -> Self {
        Self { experiments }
    }

    /// Experiments in submission order.
    pub fn experiments(&self) -> &[CircuitPayload] {
        &self.experiments
    }

    /// Look up an experiment by label (`experiment_<index>`).
    ///
    /// Only labels produced by [`iter`](Self::iter) match; `experiment_01`
    /// or `experiment_+1` do not.
    pub fn get(&self, label: &str) -> Option<&CircuitPayload> {
        self.experiments.get(label_index(label)?)
    }

    /// Iterate over `(label, experiment)` pairs in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &CircuitPayload)> {
        self.experiments
            .iter()
            .enumerate()
            .map(|(i, e)| (experiment_label(i), e))
    }

    /// Number of experiments.
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// Check if the payload has no experiments.
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }
}

impl Serialize for SubmissionPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.experiments.len()))?;
        for (label, experiment) in self.iter() {
            map.serialize_entry(&label, experiment)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SubmissionPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, CircuitPayload>::deserialize(deserializer)?;
        let mut indexed = raw
            .into_iter()
            .map(|(label, payload)| {
                label_index(&label)
                    .map(|i| (i, payload))
                    .ok_or_else(|| D::Error::custom(format!("invalid experiment label '{label}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        indexed.sort_by_key(|(i, _)| *i);

        if indexed.iter().enumerate().any(|(pos, (i, _))| pos != *i) {
            return Err(D::Error::custom("experiment labels are not contiguous"));
        }
        Ok(Self::new(indexed.into_iter().map(|(_, p)| p).collect()))
    }
}

/// Index of a canonical `experiment_<index>` label.
fn label_index(label: &str) -> Option<usize> {
    let index = label.strip_prefix(EXPERIMENT_PREFIX)?.parse().ok()?;
    (experiment_label(index) == label).then_some(index)
}

/// Global wire offsets of a circuit's registers.
struct WireLayout<'c> {
    registers: FxHashMap<&'c str, (u32, u32)>,
}

impl<'c> WireLayout<'c> {
    fn new(circuit: &'c Circuit) -> Self {
        let mut offset = 0;
        let mut registers = FxHashMap::default();
        for reg in circuit.registers() {
            registers.insert(reg.name.as_str(), (offset, reg.size));
            offset += reg.size;
        }
        Self { registers }
    }

    fn resolve(&self, wire: &Wire) -> ColdAtomResult<u32> {
        match self.registers.get(wire.register.as_str()) {
            Some(&(offset, size)) if wire.index < size => Ok(offset + wire.index),
            Some(_) => Err(ColdAtomError::InvalidCircuit(format!(
                "wire {wire} is out of range for its register"
            ))),
            None => Err(ColdAtomError::InvalidCircuit(format!(
                "wire {wire} refers to an unknown register"
            ))),
        }
    }
}

/// Translate one circuit, without batch limits.
pub fn translate_circuit(
    circuit: &Circuit,
    capabilities: &BackendCapabilities,
    shots: u32,
) -> ColdAtomResult<CircuitPayload> {
    translate_with(circuit, &InstructionValidator::new(capabilities), shots)
}

fn translate_with(
    circuit: &Circuit,
    validator: &InstructionValidator<'_>,
    shots: u32,
) -> ColdAtomResult<CircuitPayload> {
    let layout = WireLayout::new(circuit);
    let instructions = circuit
        .operations()
        .iter()
        .map(|op| {
            let wires = op
                .wires
                .iter()
                .map(|w| layout.resolve(w))
                .collect::<ColdAtomResult<Vec<_>>>()?;
            validator.bind(&op.name, wires, &op.params)
        })
        .collect::<ColdAtomResult<Vec<_>>>()?;

    Ok(CircuitPayload {
        instructions,
        shots,
        num_wires: circuit.num_wires(),
    })
}

/// Translate a batch of circuits into a submission payload.
///
/// Batch limits (experiment count, shots) are checked before any
/// instruction; the first failing instruction aborts the whole batch.
pub fn translate(
    circuits: &[Circuit],
    capabilities: &BackendCapabilities,
    shots: u32,
) -> ColdAtomResult<SubmissionPayload> {
    if circuits.is_empty() {
        return Err(ColdAtomError::EmptySubmission);
    }
    if circuits.len() > capabilities.max_experiments() {
        return Err(ColdAtomError::TooManyExperiments {
            requested: circuits.len(),
            allowed: capabilities.max_experiments(),
        });
    }
    if shots == 0 {
        return Err(ColdAtomError::InvalidShots(
            "shot count must be at least 1".into(),
        ));
    }
    if shots > capabilities.max_shots() {
        return Err(ColdAtomError::TooManyShots {
            requested: shots,
            allowed: capabilities.max_shots(),
        });
    }

    let validator = InstructionValidator::new(capabilities);
    let experiments = circuits
        .iter()
        .map(|c| translate_with(c, &validator, shots))
        .collect::<ColdAtomResult<Vec<_>>>()?;

    debug!(
        "Translated {} circuit(s) for {} with {} shots each",
        experiments.len(),
        capabilities.name(),
        shots
    );
    Ok(SubmissionPayload::new(experiments))
}
