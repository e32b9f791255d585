//! Family member form

use serde::{Deserialize, Serialize};

use super::{choice, format_date, optional_date, required_text, FormErrors};
use crate::models::{BloodGroup, FamilyMember, MemberInput, Relation};

pub const NAME_MAX_LENGTH: usize = 100;

/// Submitted (or pre-filled) family member form
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MemberForm {
    pub name: String,
    pub relation: String,
    pub date_of_birth: String,
    pub blood_group: String,
    pub notes: String,
}

impl MemberForm {
    /// Pre-fill the form from an existing member for editing
    pub fn from_member(member: &FamilyMember) -> Self {
        Self {
            name: member.name.clone(),
            relation: member.relation.value().to_string(),
            date_of_birth: format_date(member.date_of_birth),
            blood_group: member.blood_group.value().to_string(),
            notes: member.notes.clone(),
        }
    }

    pub fn validate(&self) -> Result<MemberInput, FormErrors> {
        let mut errors = FormErrors::new();

        let name = required_text(&mut errors, "name", &self.name, NAME_MAX_LENGTH);
        let relation = choice::<Relation>(&mut errors, "relation", &self.relation, None);
        let date_of_birth = optional_date(&mut errors, "date_of_birth", &self.date_of_birth);
        let blood_group = choice(
            &mut errors,
            "blood_group",
            &self.blood_group,
            Some(BloodGroup::default()),
        );
        let notes = self.notes.trim().to_string();

        match (relation, blood_group) {
            (Some(relation), Some(blood_group)) if errors.is_empty() => Ok(MemberInput {
                name,
                relation,
                date_of_birth,
                blood_group,
                notes,
            }),
            _ => Err(errors),
        }
    }
}
