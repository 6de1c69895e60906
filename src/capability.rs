//! Backend capability descriptor.
//!
//! This module defines what a cold-atom backend accepts: the number of
//! wires, the atomic species partitioning them, the supported instruction
//! names, the coupling map of every native gate, and the per-submission
//! limits on experiments and shots.
//!
//! - [`BackendConfiguration`] is the flat JSON document served by the
//!   backend's `config` endpoint.
//! - [`BackendCapabilities`] is the validated, read-only descriptor built
//!   from it. The translator and validator only ever see this type.
//!
//! Coupling maps are **order-sensitive**: `[0, 1]` and `[1, 0]` are
//! distinct couplings. A gate with an empty or absent coupling map
//! accepts any wiring.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::circuit::{Circuit, QuantumRegister};
use crate::error::{ColdAtomError, ColdAtomResult};

/// Default number of shots per experiment.
pub const DEFAULT_SHOTS: u32 = 60;

/// A native gate as described by the backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDefinition {
    /// Gate name (must also be a supported instruction).
    pub name: String,
    /// Names of the gate parameters, in order.
    #[serde(default)]
    pub parameters: Vec<String>,
    /// OpenQASM declaration of the gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qasm_def: Option<String>,
    /// Permitted wire tuples. `None` or empty means any wiring.
    #[serde(default)]
    pub coupling_map: Option<Vec<Vec<u32>>>,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

impl GateDefinition {
    /// Create a gate definition with a coupling map.
    pub fn new(
        name: impl Into<String>,
        parameters: &[&str],
        coupling_map: Vec<Vec<u32>>,
    ) -> Self {
        let name = name.into();
        let qasm_def = format!("gate {name}({}) {{}}", parameters.join(", "));
        Self {
            name,
            parameters: parameters.iter().map(|p| (*p).to_string()).collect(),
            qasm_def: Some(qasm_def),
            coupling_map: Some(coupling_map),
            description: String::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Backend configuration document, as served by the `config` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfiguration {
    /// Name of the backend.
    pub backend_name: String,
    /// Backend version string.
    #[serde(default)]
    pub backend_version: String,
    /// Total number of wires.
    pub n_qubits: u32,
    /// Atomic species, one register per species.
    #[serde(default)]
    pub atomic_species: Vec<String>,
    /// Native gates with their coupling maps.
    #[serde(default)]
    pub gates: Vec<GateDefinition>,
    /// All instruction names the backend accepts.
    pub supported_instructions: Vec<String>,
    /// Maximum shots per experiment.
    pub max_shots: u32,
    /// Maximum experiments per submission.
    pub max_experiments: usize,
    /// Basis gate names.
    #[serde(default)]
    pub basis_gates: Vec<String>,
    /// Whether this is a simulator.
    #[serde(default)]
    pub simulator: bool,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Device-wide coupling map (informational only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupling_map: Option<Vec<Vec<u32>>>,
}

impl BackendConfiguration {
    /// Parse a configuration document.
    ///
    /// Missing or mistyped required fields yield
    /// [`ColdAtomError::ConfigurationMissing`].
    pub fn from_value(value: serde_json::Value) -> ColdAtomResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| ColdAtomError::ConfigurationMissing(e.to_string()))
    }
}

/// Validated capabilities of a cold-atom backend.
///
/// Built once per backend connection and read-only afterwards. Every key
/// of the native-gate map is also a supported instruction.
#[derive(Debug, Clone)]
pub struct BackendCapabilities {
    name: String,
    version: String,
    description: String,
    is_simulator: bool,
    wire_count: u32,
    atomic_species: Vec<String>,
    gates: Vec<GateDefinition>,
    native_gates: FxHashMap<String, Vec<Vec<u32>>>,
    supported_instructions: Vec<String>,
    basis_gates: Vec<String>,
    max_experiments: usize,
    max_shots: u32,
}

impl BackendCapabilities {
    /// Create capabilities with no instructions, one experiment and
    /// [`DEFAULT_SHOTS`] shots.
    pub fn new(name: impl Into<String>, wire_count: u32) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            description: String::new(),
            is_simulator: false,
            wire_count,
            atomic_species: vec![],
            gates: vec![],
            native_gates: FxHashMap::default(),
            supported_instructions: vec![],
            basis_gates: vec![],
            max_experiments: 1,
            max_shots: DEFAULT_SHOTS,
        }
    }

    /// Capabilities of the sodium/lithium mixtures device (one trapping site).
    pub fn mixtures() -> Self {
        Self::new("cold_atom_mixtures", 2)
            .with_version("0.0.1")
            .with_description(
                "Setup of an atomic mixtures experiment with one trapping site and two \
                 atomic species, namely Na and Li.",
            )
            .with_species(["na", "li"])
            .with_gate(
                GateDefinition::new("delay", &["tau", "delta"], vec![vec![0, 1]])
                    .with_description("evolution under SCC Hamiltonian for time tau"),
            )
            .with_gate(
                GateDefinition::new("rx", &["theta"], vec![vec![0]])
                    .with_description("Rotation of the sodium spin"),
            )
            .with_instructions(["measure", "barrier"])
            .with_basis_gates(["rx", "delay"])
            .with_limits(3, 60)
    }

    /// Capabilities of the mixtures mean-field simulator (four sites).
    pub fn mixtures_simulator() -> Self {
        let single: Vec<Vec<u32>> = (0..8).map(|w| vec![w]).collect();
        Self::new("atomic_mixtures_meanfield_simulator", 8)
            .with_version("0.0.1")
            .with_description("Cold atom simulator")
            .simulator(true)
            .with_species(["na", "li"])
            .with_gate(
                GateDefinition::new("delay", &["tau", "delta"], vec![(0..8).collect()])
                    .with_description("evolution under SCC Hamiltonian for time tau"),
            )
            .with_gate(
                GateDefinition::new("couple", &["omega"], vec![vec![4, 5], vec![5, 6], vec![6, 7]])
                    .with_description(
                        "raman-assisted tunnel coupling of Li states on neighbouring sites",
                    ),
            )
            .with_gate(
                GateDefinition::new("rx", &["theta"], single.clone())
                    .with_description("x-Rotation of the spin"),
            )
            .with_gate(
                GateDefinition::new("ry", &["theta"], single)
                    .with_description("y-Rotation of the spin"),
            )
            .with_instructions(["measure", "barrier"])
            .with_basis_gates(["delay", "couple", "rx", "ry"])
            .with_limits(1, 60)
    }

    /// Capabilities of qubits encoded in coherent spins of trapped BECs.
    ///
    /// All-to-all wiring: no gate carries a coupling map.
    pub fn coherent_spin_qubits() -> Self {
        Self::new("coherent_spin_qubits", 5)
            .with_version("0.0.1")
            .with_description("Cold atom qubits encoded in coherent spins of trapped BECs")
            .with_instructions(["id", "rx", "rz", "cz", "measure", "barrier"])
            .with_basis_gates(["id", "rx", "rz", "cz"])
            .with_limits(1, 1000)
    }

    /// Set the backend version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the backend as a simulator.
    pub fn simulator(mut self, is_simulator: bool) -> Self {
        self.is_simulator = is_simulator;
        self
    }

    /// Set the atomic species, one register per species.
    pub fn with_species<S: Into<String>>(mut self, species: impl IntoIterator<Item = S>) -> Self {
        self.atomic_species = species.into_iter().map(Into::into).collect();
        self
    }

    /// Add a native gate. The gate name is also added to the supported
    /// instructions.
    pub fn with_gate(mut self, gate: GateDefinition) -> Self {
        self.add_supported(&gate.name);
        self.native_gates
            .insert(gate.name.clone(), gate.coupling_map.clone().unwrap_or_default());
        self.gates.push(gate);
        self
    }

    /// Add supported instruction names that are not native gates
    /// (`measure`, `barrier`, ...).
    pub fn with_instructions<S: AsRef<str>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        for name in names {
            self.add_supported(name.as_ref());
        }
        self
    }

    /// Set the basis gate names.
    pub fn with_basis_gates<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.basis_gates = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the experiment and shot limits.
    pub fn with_limits(mut self, max_experiments: usize, max_shots: u32) -> Self {
        self.max_experiments = max_experiments;
        self.max_shots = max_shots;
        self
    }

    fn add_supported(&mut self, name: &str) {
        if !self.supports(name) {
            self.supported_instructions.push(name.to_string());
        }
    }

    /// Backend name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether this is a simulator.
    pub fn is_simulator(&self) -> bool {
        self.is_simulator
    }

    /// Total number of wires.
    pub fn wire_count(&self) -> u32 {
        self.wire_count
    }

    /// Atomic species in register order.
    pub fn atomic_species(&self) -> &[String] {
        &self.atomic_species
    }

    /// Native gate definitions.
    pub fn gates(&self) -> &[GateDefinition] {
        &self.gates
    }

    /// Supported instruction names.
    pub fn supported_instructions(&self) -> &[String] {
        &self.supported_instructions
    }

    /// Maximum experiments per submission.
    pub fn max_experiments(&self) -> usize {
        self.max_experiments
    }

    /// Maximum shots per experiment.
    pub fn max_shots(&self) -> u32 {
        self.max_shots
    }

    /// Check if an instruction name is supported.
    pub fn supports(&self, name: &str) -> bool {
        self.supported_instructions.iter().any(|n| n == name)
    }

    /// Coupling map of a native gate, or `None` if `name` is not native.
    pub fn coupling_map(&self, name: &str) -> Option<&[Vec<u32>]> {
        self.native_gates.get(name).map(Vec::as_slice)
    }

    /// Check if a gate may act on `wires` (order-sensitive).
    ///
    /// Instructions that are not native gates, and native gates with an
    /// empty coupling map, accept any wiring.
    pub fn allows_coupling(&self, name: &str, wires: &[u32]) -> bool {
        match self.coupling_map(name) {
            Some(map) if !map.is_empty() => map.iter().any(|c| c.as_slice() == wires),
            _ => true,
        }
    }

    /// Build an empty circuit with one register per atomic species.
    ///
    /// Each register gets `wire_count / species` wires.
    pub fn empty_circuit(&self) -> ColdAtomResult<Circuit> {
        let species = u32::try_from(self.atomic_species.len()).unwrap_or(u32::MAX);
        if species == 0 {
            return Err(ColdAtomError::InvalidConfiguration(format!(
                "{} declares no atomic species",
                self.name
            )));
        }
        if self.wire_count % species != 0 {
            return Err(ColdAtomError::InvalidConfiguration(format!(
                "num_wires {} must be multiple of num_species {species}",
                self.wire_count
            )));
        }
        let size = self.wire_count / species;
        Circuit::with_registers(
            self.atomic_species
                .iter()
                .map(|s| QuantumRegister::new(s.clone(), size)),
        )
    }

    /// Render these capabilities as a configuration document.
    pub fn to_configuration(&self) -> BackendConfiguration {
        BackendConfiguration {
            backend_name: self.name.clone(),
            backend_version: self.version.clone(),
            n_qubits: self.wire_count,
            atomic_species: self.atomic_species.clone(),
            gates: self.gates.clone(),
            supported_instructions: self.supported_instructions.clone(),
            max_shots: self.max_shots,
            max_experiments: self.max_experiments,
            basis_gates: self.basis_gates.clone(),
            simulator: self.is_simulator,
            description: self.description.clone(),
            coupling_map: None,
        }
    }
}

impl TryFrom<BackendConfiguration> for BackendCapabilities {
    type Error = ColdAtomError;

    fn try_from(config: BackendConfiguration) -> ColdAtomResult<Self> {
        if let Some(gate) = config
            .gates
            .iter()
            .find(|g| !config.supported_instructions.contains(&g.name))
        {
            return Err(ColdAtomError::InvalidConfiguration(format!(
                "native gate '{}' is not a supported instruction of {}",
                gate.name, config.backend_name
            )));
        }

        let native_gates = config
            .gates
            .iter()
            .map(|g| (g.name.clone(), g.coupling_map.clone().unwrap_or_default()))
            .collect();

        Ok(Self {
            name: config.backend_name,
            version: config.backend_version,
            description: config.description,
            is_simulator: config.simulator,
            wire_count: config.n_qubits,
            atomic_species: config.atomic_species,
            gates: config.gates,
            native_gates,
            supported_instructions: config.supported_instructions,
            basis_gates: config.basis_gates,
            max_experiments: config.max_experiments,
            max_shots: config.max_shots,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn mixtures_document() -> serde_json::Value {
        json!({
            "backend_name": "cold_atom_mixtures",
            "backend_version": "0.0.1",
            "simulator": false,
            "coupling_map": [[0, 1]],
            "basis_gates": ["rx", "delay"],
            "atomic_species": ["na", "li"],
            "gates": [
                {"name": "delay", "parameters": ["tau", "delta"],
                 "qasm_def": "gate delay(tau, delta) {}", "coupling_map": [[0, 1]],
                 "description": "evolution under SCC Hamiltonian for time tau"},
                {"name": "rx", "parameters": ["theta"],
                 "qasm_def": "gate rx(theta) {}", "coupling_map": [[0]],
                 "description": "Rotation of the sodium spin"}
            ],
            "supported_instructions": ["delay", "rx", "measure", "barrier"],
            "memory": true,
            "n_qubits": 2,
            "max_shots": 60,
            "max_experiments": 3
        })
    }

    #[test]
    fn test_capabilities_from_document() {
        let config = BackendConfiguration::from_value(mixtures_document()).unwrap();
        let caps = BackendCapabilities::try_from(config).unwrap();
        assert_eq!(caps.name(), "cold_atom_mixtures");
        assert_eq!(caps.wire_count(), 2);
        assert_eq!(caps.max_experiments(), 3);
        assert!(caps.supports("measure"));
        assert_eq!(caps.coupling_map("rx"), Some(&[vec![0]][..]));
        assert_eq!(caps.coupling_map("measure"), None);
    }

    #[test]
    fn test_missing_field_is_configuration_missing() {
        let mut doc = mixtures_document();
        doc.as_object_mut().unwrap().remove("max_experiments");
        let err = BackendConfiguration::from_value(doc).unwrap_err();
        assert!(matches!(
            err,
            ColdAtomError::ConfigurationMissing(ref m) if m.contains("max_experiments")
        ));
    }

    #[test]
    fn test_native_gate_must_be_supported() {
        let mut config = BackendConfiguration::from_value(mixtures_document()).unwrap();
        config.supported_instructions.retain(|n| n != "rx");
        let err = BackendCapabilities::try_from(config).unwrap_err();
        assert!(matches!(err, ColdAtomError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_coupling_is_order_sensitive() {
        let caps = BackendCapabilities::mixtures_simulator();
        assert!(caps.allows_coupling("couple", &[4, 5]));
        assert!(!caps.allows_coupling("couple", &[5, 4]));
        assert!(caps.allows_coupling("measure", &[3]));
    }

    #[test]
    fn test_empty_coupling_map_allows_any_wiring() {
        let caps = BackendCapabilities::new("any", 4)
            .with_gate(GateDefinition::new("rot", &["chi"], vec![]));
        assert!(caps.allows_coupling("rot", &[3, 1]));
    }

    #[test]
    fn test_presets_round_trip_through_document() {
        for caps in [
            BackendCapabilities::mixtures(),
            BackendCapabilities::mixtures_simulator(),
            BackendCapabilities::coherent_spin_qubits(),
        ] {
            let rebuilt = BackendCapabilities::try_from(caps.to_configuration()).unwrap();
            assert_eq!(rebuilt.name(), caps.name());
            assert_eq!(rebuilt.supported_instructions(), caps.supported_instructions());
            assert_eq!(rebuilt.max_shots(), caps.max_shots());
        }
    }

    #[test]
    fn test_empty_circuit_one_register_per_species() {
        let circuit = BackendCapabilities::mixtures_simulator().empty_circuit().unwrap();
        let regs = circuit.registers();
        assert_eq!(regs.len(), 2);
        assert_eq!(regs[0], QuantumRegister::new("na", 4));
        assert_eq!(regs[1], QuantumRegister::new("li", 4));
    }

    #[test]
    fn test_empty_circuit_rejects_uneven_species() {
        let caps = BackendCapabilities::new("odd", 3).with_species(["na", "li"]);
        assert!(matches!(
            caps.empty_circuit(),
            Err(ColdAtomError::InvalidConfiguration(_))
        ));
        assert!(BackendCapabilities::coherent_spin_qubits().empty_circuit().is_err());
    }
}
