use serde::{Deserialize, Serialize};

/// A single field-level rule violation found by the product validator.
///
/// Purely informational: a product with violations still completes the
/// pipeline and is still encoded. The orchestrator decides whether to
/// include, flag, or drop it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field the rule applies to, e.g. `"sku"` or `"variations[2].sku"`.
    pub field: String,
    /// The offending value, possibly empty.
    pub value: String,
    /// Short description of the expected constraint.
    pub constraint: String,
    /// Human-readable message combining the above.
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: &str, value: &str, constraint: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
            message: format!("field '{field}' with value '{value}' failed: {constraint}"),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
