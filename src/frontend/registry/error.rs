//! Declaration-time errors

use thiserror::Error;

use crate::util::diagnostic::{Diagnostic, ErrorCodeDefinition, ToDiagnostic};

/// Error raised while declaring categories, operators, scopes or imports.
///
/// Declarations are atomic: when one of these is returned the registry is
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("declaring '{category}' would create a tightness cycle: {}", .cycle.join(" > "))]
    CategoryCycle { category: String, cycle: Vec<String> },

    #[error("unknown category '{category}'")]
    UnknownCategory { category: String },

    #[error("category '{category}' is already declared")]
    DuplicateCategory { category: String },

    #[error("operator '{name}' conflicts with '{existing}': {reason}")]
    DuplicateOperator {
        name: String,
        existing: String,
        reason: String,
    },

    #[error("invalid display form for operator '{name}': {reason}")]
    InvalidForm { name: String, reason: String },

    #[error("unknown operator '{name}'")]
    UnknownOperator { name: String },

    #[error("unknown scope '{scope}'")]
    UnknownScope { scope: String },
}

impl RegistryError {
    /// Registered error code
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::CategoryCycle { .. } => "E0101",
            RegistryError::UnknownCategory { .. } => "E0102",
            RegistryError::DuplicateCategory { .. } => "E0103",
            RegistryError::DuplicateOperator { .. } => "E0201",
            RegistryError::InvalidForm { .. } => "E0202",
            RegistryError::UnknownOperator { .. } => "E0203",
            RegistryError::UnknownScope { .. } => "E0204",
        }
    }
}

impl ToDiagnostic for RegistryError {
    fn to_diagnostic(&self) -> Diagnostic {
        let Some(definition) = ErrorCodeDefinition::find(self.code()) else {
            return Diagnostic::note(self.to_string(), crate::util::span::Span::dummy());
        };
        let builder = definition.builder();
        let builder = match self {
            RegistryError::CategoryCycle { category, cycle } => builder
                .param("category", category.clone())
                .param("cycle", cycle.join(" > ")),
            RegistryError::UnknownCategory { category }
            | RegistryError::DuplicateCategory { category } => {
                builder.param("category", category.clone())
            }
            RegistryError::DuplicateOperator {
                name,
                existing,
                reason,
            } => builder
                .param("name", name.clone())
                .param("existing", existing.clone())
                .param("reason", reason.clone()),
            RegistryError::InvalidForm { name, reason } => builder
                .param("name", name.clone())
                .param("reason", reason.clone()),
            RegistryError::UnknownOperator { name } => builder.param("name", name.clone()),
            RegistryError::UnknownScope { scope } => builder.param("scope", scope.clone()),
        };
        builder.build()
    }
}
