//! One-line confirmations.

use std::fmt;

/// A success or failure line for commands with nothing else to show.
pub struct OperationStatus {
    pub message: String,
    pub success: bool,
}

impl OperationStatus {
    pub fn success(message: String) -> Self {
        Self {
            message,
            success: true,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            message,
            success: false,
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.success { "Success:" } else { "Error:" };
        writeln!(f, "{label} {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let cleared = OperationStatus::success("Session pointer cleared".to_string());
        assert_eq!(cleared.to_string(), "Success: Session pointer cleared\n");

        let missing = OperationStatus::failure("No session to clear".to_string());
        assert!(missing.to_string().starts_with("Error:"));
    }
}
