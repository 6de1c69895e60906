//! Circuit abstraction consumed by the translator.
//!
//! A [`Circuit`] is an ordered list of quantum registers plus an ordered
//! list of [`Operation`]s. Operations address wires by register name and
//! local index ([`Wire`]); the translator resolves them to global indices
//! by concatenating the registers in declaration order.
//!
//! Operation names are opaque to this crate: `rx`, `delay`, `couple`,
//! `measure` and friends are whatever the backend lists as supported.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ColdAtomError, ColdAtomResult};

/// A named group of wires, typically one atomic species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantumRegister {
    /// Register label (e.g. `"na"`, `"li"`).
    pub name: String,
    /// Number of wires in the register.
    pub size: u32,
}

impl QuantumRegister {
    /// Create a register.
    pub fn new(name: impl Into<String>, size: u32) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Reference to one wire of a register.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wire {
    /// Name of the owning register.
    pub register: String,
    /// Index within the register.
    pub index: u32,
}

impl Wire {
    /// Create a wire reference.
    pub fn new(register: impl Into<String>, index: u32) -> Self {
        Self {
            register: register.into(),
            index,
        }
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

/// A gate parameter: either bound to a number or still symbolic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    /// A concrete numeric value.
    Constant(f64),
    /// An unbound symbolic parameter.
    Symbol(String),
}

impl Parameter {
    /// Create a symbolic parameter.
    pub fn symbol(name: impl Into<String>) -> Self {
        Parameter::Symbol(name.into())
    }

    /// Check if this parameter is still symbolic.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Parameter::Symbol(_))
    }

    /// The value as `f64`, if bound.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Parameter::Constant(v) => Some(*v),
            Parameter::Symbol(_) => None,
        }
    }
}

impl From<f64> for Parameter {
    fn from(v: f64) -> Self {
        Parameter::Constant(v)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Constant(v) => write!(f, "{v}"),
            Parameter::Symbol(s) => write!(f, "{s}"),
        }
    }
}

/// One instruction as authored in the circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Instruction name.
    pub name: String,
    /// Operand wires, in order.
    pub wires: Vec<Wire>,
    /// Parameters, in order.
    pub params: Vec<Parameter>,
}

/// A circuit: ordered registers and ordered operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Circuit {
    registers: Vec<QuantumRegister>,
    operations: Vec<Operation>,
}

impl Circuit {
    /// Create an empty circuit without registers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a circuit from a list of registers.
    pub fn with_registers(
        registers: impl IntoIterator<Item = QuantumRegister>,
    ) -> ColdAtomResult<Self> {
        let mut circuit = Self::new();
        for reg in registers {
            circuit.add_register(reg.name, reg.size)?;
        }
        Ok(circuit)
    }

    /// Append a register. Register names must be unique.
    pub fn add_register(&mut self, name: impl Into<String>, size: u32) -> ColdAtomResult<()> {
        let name = name.into();
        if self.registers.iter().any(|r| r.name == name) {
            return Err(ColdAtomError::InvalidCircuit(format!(
                "duplicate register '{name}'"
            )));
        }
        self.registers.push(QuantumRegister::new(name, size));
        Ok(())
    }

    /// Registers in declaration order.
    pub fn registers(&self) -> &[QuantumRegister] {
        &self.registers
    }

    /// Operations in authoring order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Total number of wires across all registers.
    pub fn num_wires(&self) -> u32 {
        self.registers.iter().map(|r| r.size).sum()
    }

    /// Append an operation.
    ///
    /// Operands are not checked here; unknown wires surface when the
    /// circuit is translated.
    pub fn append(
        &mut self,
        name: impl Into<String>,
        wires: impl IntoIterator<Item = Wire>,
        params: impl IntoIterator<Item = Parameter>,
    ) -> &mut Self {
        self.operations.push(Operation {
            name: name.into(),
            wires: wires.into_iter().collect(),
            params: params.into_iter().collect(),
        });
        self
    }

    /// Append a parameterless `measure` on one wire.
    pub fn measure(&mut self, wire: Wire) -> &mut Self {
        self.append("measure", [wire], [])
    }

    /// Append a `barrier` across the given wires.
    pub fn barrier(&mut self, wires: impl IntoIterator<Item = Wire>) -> &mut Self {
        self.append("barrier", wires, [])
    }

    /// All wires of the circuit in global order.
    pub fn wires(&self) -> Vec<Wire> {
        self.registers
            .iter()
            .flat_map(|r| (0..r.size).map(|i| Wire::new(r.name.clone(), i)))
            .collect()
    }
}
