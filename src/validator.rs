//! Instruction validation against backend capabilities.
//!
//! Checks run in a fixed order and the first failure is returned:
//!
//! 1. every parameter is bound to a finite number
//!    ([`ColdAtomError::UnboundParameter`]),
//! 2. the name is a supported instruction
//!    ([`ColdAtomError::UnsupportedInstruction`]),
//! 3. for native gates, the wire tuple is in the coupling map
//!    ([`ColdAtomError::IllegalCoupling`]).
//!
//! Validation is pure: no I/O, no state.

use crate::capability::BackendCapabilities;
use crate::circuit::Parameter;
use crate::error::{ColdAtomError, ColdAtomResult};
use crate::translator::Instruction;

/// Validates instructions against one backend's capabilities.
#[derive(Debug, Clone, Copy)]
pub struct InstructionValidator<'a> {
    capabilities: &'a BackendCapabilities,
}

impl<'a> InstructionValidator<'a> {
    /// Create a validator for the given capabilities.
    pub fn new(capabilities: &'a BackendCapabilities) -> Self {
        Self { capabilities }
    }

    /// Bind the parameters of an authored operation and validate the
    /// resulting instruction.
    pub fn bind(
        &self,
        name: &str,
        wires: Vec<u32>,
        params: &[Parameter],
    ) -> ColdAtomResult<Instruction> {
        let values = params
            .iter()
            .map(|p| {
                p.as_f64().ok_or_else(|| ColdAtomError::UnboundParameter {
                    instruction: name.to_string(),
                    parameter: p.to_string(),
                })
            })
            .collect::<ColdAtomResult<Vec<_>>>()?;

        let instruction = Instruction::new(name, wires, values);
        self.validate(&instruction)?;
        Ok(instruction)
    }

    /// Validate an already numeric instruction.
    pub fn validate(&self, instruction: &Instruction) -> ColdAtomResult<()> {
        let caps = self.capabilities;

        if let Some(value) = instruction.params.iter().find(|v| !v.is_finite()) {
            return Err(ColdAtomError::UnboundParameter {
                instruction: instruction.name.clone(),
                parameter: value.to_string(),
            });
        }

        if !caps.supports(&instruction.name) {
            return Err(ColdAtomError::UnsupportedInstruction {
                name: instruction.name.clone(),
                backend: caps.name().to_string(),
            });
        }

        if !caps.allows_coupling(&instruction.name, &instruction.wires) {
            return Err(ColdAtomError::IllegalCoupling {
                name: instruction.name.clone(),
                wires: instruction.wires.clone(),
                backend: caps.name().to_string(),
                allowed: caps
                    .coupling_map(&instruction.name)
                    .map(<[Vec<u32>]>::to_vec)
                    .unwrap_or_default(),
            });
        }

        Ok(())
    }
}

/// Validate one instruction against `capabilities`.
pub fn validate_instruction(
    instruction: &Instruction,
    capabilities: &BackendCapabilities,
) -> ColdAtomResult<()> {
    InstructionValidator::new(capabilities).validate(instruction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::GateDefinition;

    fn caps() -> BackendCapabilities {
        BackendCapabilities::new("test_backend", 8)
            .with_gate(GateDefinition::new(
                "couple",
                &["omega"],
                vec![vec![4, 5], vec![5, 6], vec![6, 7]],
            ))
            .with_instructions(["measure"])
    }

    #[test]
    fn test_valid_coupling() {
        let inst = Instruction::new("couple", vec![4, 5], vec![1.0]);
        assert!(validate_instruction(&inst, &caps()).is_ok());
    }

    #[test]
    fn test_reversed_coupling_rejected() {
        let inst = Instruction::new("couple", vec![5, 4], vec![1.0]);
        let err = validate_instruction(&inst, &caps()).unwrap_err();
        match err {
            ColdAtomError::IllegalCoupling {
                name,
                wires,
                backend,
                allowed,
            } => {
                assert_eq!(name, "couple");
                assert_eq!(wires, vec![5, 4]);
                assert_eq!(backend, "test_backend");
                assert_eq!(allowed, vec![vec![4, 5], vec![5, 6], vec![6, 7]]);
            }
            other => panic!("Expected IllegalCoupling, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_instruction() {
        let inst = Instruction::new("cx", vec![0, 1], vec![]);
        let err = validate_instruction(&inst, &caps()).unwrap_err();
        assert!(
            matches!(err, ColdAtomError::UnsupportedInstruction { ref name, ref backend }
                if name == "cx" && backend == "test_backend")
        );
    }

    #[test]
    fn test_non_native_instruction_any_wiring() {
        let inst = Instruction::new("measure", vec![7], vec![]);
        assert!(validate_instruction(&inst, &caps()).is_ok());
    }

    #[test]
    fn test_symbolic_parameter_rejected_first() {
        // Unsupported name too, but parameters are checked first.
        let caps = caps();
        let validator = InstructionValidator::new(&caps);
        let err = validator
            .bind("cx", vec![0, 1], &[Parameter::symbol("theta")])
            .unwrap_err();
        assert!(matches!(
            err,
            ColdAtomError::UnboundParameter { ref parameter, .. } if parameter == "theta"
        ));
    }

    #[test]
    fn test_non_finite_parameter_rejected() {
        let inst = Instruction::new("couple", vec![4, 5], vec![f64::NAN]);
        assert!(matches!(
            validate_instruction(&inst, &caps()),
            Err(ColdAtomError::UnboundParameter { .. })
        ));
    }

    #[test]
    fn test_bind_resolves_values() {
        let caps = caps();
        let inst = InstructionValidator::new(&caps)
            .bind("couple", vec![6, 7], &[Parameter::from(0.25)])
            .unwrap();
        assert_eq!(inst, Instruction::new("couple", vec![6, 7], vec![0.25]));
    }
}
