use crate::canvas::Section;

/// A course section managed by the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabSection {
    pub id: u64,
    pub name: String,
}

pub fn is_lab(name: &str) -> bool {
    name.to_lowercase().contains("lab")
}

/// Keeps the lab sections, preserving the order Canvas listed them in.
pub fn lab_sections(sections: Vec<Section>) -> Vec<LabSection> {
    sections
        .into_iter()
        .filter(|s| is_lab(&s.name))
        .map(|s| LabSection { id: s.id, name: s.name })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lab_match_ignores_case() {
        assert!(is_lab("LAB 301"));
        assert!(is_lab("Chem 109 Lab 2"));
        assert!(!is_lab("Lecture 001"));
    }

    #[test]
    fn test_lab_sections_keep_order() {
        let sections = vec![
            Section { id: 3, name: "Lab B".to_string() },
            Section { id: 1, name: "Lecture".to_string() },
            Section { id: 2, name: "Lab A".to_string() },
        ];
        let labs = lab_sections(sections);
        assert_eq!(labs.iter().map(|s| s.id).collect::<Vec<_>>(), vec![3, 2]);
    }
}
