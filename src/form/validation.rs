/// Result of projecting the validation rules onto the form's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid {
        issues: usize,
        global_errors: Vec<String>,
    },
    BuildError {
        message: String,
    },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn issue_count(&self) -> usize {
        match self {
            ValidationOutcome::Valid => 0,
            ValidationOutcome::Invalid { issues, .. } => *issues,
            ValidationOutcome::BuildError { .. } => 1,
        }
    }
}
