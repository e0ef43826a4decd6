use crate::domain::model::Profile;
use serde::Serialize;

/// Required fields, in report order.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "name",
    "title",
    "summary",
    "experience",
    "education",
    "skills",
    "languages",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub missing: Vec<&'static str>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Reports which required fields are empty. Never fails; nested entries are not inspected.
pub fn validate(profile: &Profile) -> ValidationReport {
    let present = [
        !profile.name.trim().is_empty(),
        !profile.title.trim().is_empty(),
        !profile.summary.trim().is_empty(),
        !profile.experience.is_empty(),
        !profile.education.is_empty(),
        !profile.skills.is_empty(),
        !profile.languages.is_empty(),
    ];

    let missing = REQUIRED_FIELDS
        .iter()
        .zip(present)
        .filter(|(_, ok)| !ok)
        .map(|(field, _)| *field)
        .collect();

    ValidationReport { missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{EducationEntry, ExperienceEntry};
    use serde_json::json;

    fn complete() -> Profile {
        Profile {
            name: "Ana Ruiz".to_string(),
            title: "Engineer".to_string(),
            summary: "x".to_string(),
            experience: vec![ExperienceEntry::default()],
            education: vec![EducationEntry::default()],
            skills: vec!["Go".to_string()],
            languages: [("Spanish".to_string(), "Native".to_string())].into_iter().collect(),
            ..Profile::default()
        }
    }

    #[test]
    fn test_complete_profile_is_valid() {
        let report = validate(&complete());
        assert!(report.is_valid());
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_missing_summary_is_reported() {
        let mut profile = complete();
        profile.summary.clear();
        let report = validate(&profile);
        assert!(!report.is_valid());
        assert_eq!(report.missing, vec!["summary"]);
    }

    #[test]
    fn test_empty_record_reports_every_required_field() {
        let profile: Profile = serde_json::from_value(json!({"skills": null, "title": ""})).unwrap();
        assert_eq!(validate(&profile).missing, REQUIRED_FIELDS.to_vec());
    }

    #[test]
    fn test_contact_and_certifications_are_optional() {
        let mut profile = complete();
        profile.contact.clear();
        profile.certifications.clear();
        assert!(validate(&profile).is_valid());
    }

    #[test]
    fn test_nested_entries_are_not_inspected() {
        let mut profile = complete();
        profile.experience = vec![ExperienceEntry {
            employer: "ACME".to_string(),
            ..ExperienceEntry::default()
        }];
        assert!(validate(&profile).is_valid());
    }
}
