use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Coarse equipment-based grouping. Declaration order is the display order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum WeaponGroup {
    A,
    B,
    C,
    R,
}

impl fmt::Display for WeaponGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::R => "R",
        };
        f.write_str(code)
    }
}

/// Competitor cohort within a weapon group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Cohort {
    Open,
    Women,
    Junior,
    VeteranYounger,
    VeteranOlder,
}

impl Cohort {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Women => "Women",
            Self::Junior => "Junior",
            Self::VeteranYounger => "Veteran Younger",
            Self::VeteranOlder => "Veteran Older",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClassDefinition {
    pub code: String,
    pub weapon_group: WeaponGroup,
    pub cohort: Cohort,
}

impl ClassDefinition {
    pub fn new(code: impl Into<String>, weapon_group: WeaponGroup, cohort: Cohort) -> Self {
        Self {
            code: code.into(),
            weapon_group,
            cohort,
        }
    }
}

/// Ordered lookup table of shooting classes.
///
/// Leaderboards list classes in table order; codes missing from the table
/// sort after every known class, alphabetically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassTaxonomy {
    classes: Vec<ClassDefinition>,
}

impl ClassTaxonomy {
    pub fn new(classes: Vec<ClassDefinition>) -> Self {
        Self { classes }
    }

    /// Built-in table covering the four weapon groups.
    pub fn standard() -> Self {
        use Cohort::*;
        use WeaponGroup::*;

        let mut classes = Vec::new();
        for group in [A, B, C] {
            for level in 1..=3 {
                classes.push(ClassDefinition::new(format!("{}{}", group, level), group, Open));
            }
            if group == C {
                for level in 1..=3 {
                    classes.push(ClassDefinition::new(format!("CD{}", level), C, Women));
                }
                classes.push(ClassDefinition::new("CJ", C, Junior));
                classes.push(ClassDefinition::new("CVY", C, VeteranYounger));
                classes.push(ClassDefinition::new("CVA", C, VeteranOlder));
            }
        }
        for level in 1..=3 {
            classes.push(ClassDefinition::new(format!("R{}", level), R, Open));
        }

        Self { classes }
    }

    pub fn classes(&self) -> &[ClassDefinition] {
        &self.classes
    }

    pub fn lookup(&self, code: &str) -> Option<&ClassDefinition> {
        self.classes.iter().find(|class| class.code == code)
    }

    pub fn position(&self, code: &str) -> Option<usize> {
        self.classes.iter().position(|class| class.code == code)
    }

    /// Sort key placing unknown codes after all known ones.
    pub fn sort_key<'a>(&self, code: &'a str) -> (usize, &'a str) {
        (self.position(code).unwrap_or(usize::MAX), code)
    }
}

impl Default for ClassTaxonomy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_orders_by_group_then_cohort() {
        let taxonomy = ClassTaxonomy::standard();
        let codes: Vec<&str> = taxonomy.classes().iter().map(|c| c.code.as_str()).collect();

        assert_eq!(&codes[..4], &["A1", "A2", "A3", "B1"]);
        assert!(taxonomy.position("C3").unwrap() < taxonomy.position("CD1").unwrap());
        assert!(taxonomy.position("CVA").unwrap() < taxonomy.position("R1").unwrap());
    }

    #[test]
    fn test_unknown_classes_sort_last() {
        let taxonomy = ClassTaxonomy::standard();
        let mut codes = vec!["ZZ", "R3", "Aa", "A1"];
        codes.sort_by_key(|code| taxonomy.sort_key(*code));

        assert_eq!(codes, vec!["A1", "R3", "Aa", "ZZ"]);
    }

    #[test]
    fn test_lookup_reports_group_and_cohort() {
        let taxonomy = ClassTaxonomy::standard();
        let class = taxonomy.lookup("CJ").unwrap();

        assert_eq!(class.weapon_group, WeaponGroup::C);
        assert_eq!(class.cohort, Cohort::Junior);
        assert!(taxonomy.lookup("C4").is_none());
    }

    #[test]
    fn test_taxonomy_loads_from_json_table() {
        let json = r#"[
            {"code": "B1", "weapon_group": "B", "cohort": "open"},
            {"code": "A1", "weapon_group": "A", "cohort": "open"}
        ]"#;
        let taxonomy: ClassTaxonomy = serde_json::from_str(json).unwrap();

        assert_eq!(taxonomy.position("B1"), Some(0));
        assert_eq!(taxonomy.position("A1"), Some(1));
    }
}
