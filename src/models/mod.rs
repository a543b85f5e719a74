pub mod assignment;
pub mod section;

pub use assignment::{Assignment, AssignmentUpdate, Comparison, Field, FieldValue, SectionEntry};
pub use section::{LabSection, is_lab, lab_sections};
