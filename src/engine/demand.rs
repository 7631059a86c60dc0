// ==========================================
// Exam Planner - Demand Loader
// ==========================================
// Turns enrollment rows into one expected-attendance figure per
// module in scope. Modules without rows stay at 0; a missing
// entry is never an error downstream.
// ==========================================

use crate::domain::resources::Enrollment;
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// DemandLoader
// ==========================================
pub struct DemandLoader;

impl DemandLoader {
    pub fn new() -> Self {
        Self
    }

    /// Counts enrollment per module.
    ///
    /// # Arguments
    /// - `module_ids`: modules in scope for this run
    /// - `enrollments`: enrollment rows, already scoped by the caller
    ///
    /// # Returns
    /// Map module id -> expected attendee count; every scoped module
    /// is present, 0 when nobody is enrolled.
    pub fn expected_attendance(
        &self,
        module_ids: &[String],
        enrollments: &[Enrollment],
    ) -> HashMap<String, u32> {
        let mut counts: HashMap<String, u32> =
            module_ids.iter().map(|id| (id.clone(), 0)).collect();

        for row in enrollments {
            if let Some(count) = counts.get_mut(&row.module_id) {
                *count += 1;
            }
        }

        debug!(
            modules = module_ids.len(),
            enrollment_rows = enrollments.len(),
            "expected attendance computed"
        );

        counts
    }
}

impl Default for DemandLoader {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// Tests
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn enrollment(student: &str, module: &str) -> Enrollment {
        Enrollment {
            student_id: student.to_string(),
            module_id: module.to_string(),
        }
    }

    #[test]
    fn test_counts_rows_per_module() {
        let loader = DemandLoader::new();
        let modules = vec!["M1".to_string(), "M2".to_string()];
        let rows = vec![
            enrollment("E1", "M1"),
            enrollment("E2", "M1"),
            enrollment("E3", "M2"),
        ];

        let counts = loader.expected_attendance(&modules, &rows);

        assert_eq!(counts.get("M1"), Some(&2));
        assert_eq!(counts.get("M2"), Some(&1));
    }

    #[test]
    fn test_module_without_enrollment_maps_to_zero() {
        let loader = DemandLoader::new();
        let modules = vec!["M1".to_string(), "M2".to_string()];
        let rows = vec![enrollment("E1", "M1")];

        let counts = loader.expected_attendance(&modules, &rows);

        assert_eq!(counts.get("M2"), Some(&0));
    }

    #[test]
    fn test_rows_outside_scope_are_ignored() {
        let loader = DemandLoader::new();
        let modules = vec!["M1".to_string()];
        let rows = vec![enrollment("E1", "M1"), enrollment("E2", "M9")];

        let counts = loader.expected_attendance(&modules, &rows);

        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get("M1"), Some(&1));
    }
}
