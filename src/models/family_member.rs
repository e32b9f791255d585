//! Family member model
//!
//! A person (the account holder or a relative) whose health is tracked.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

use super::choice_enum;

choice_enum! {
    /// How a member is related to the account holder.
    Relation, "relation" {
        Myself => ("self", "Myself"),
        Father => ("father", "Father"),
        Mother => ("mother", "Mother"),
        Brother => ("brother", "Brother"),
        Sister => ("sister", "Sister"),
        Spouse => ("spouse", "Spouse"),
        Son => ("son", "Son"),
        Daughter => ("daughter", "Daughter"),
        Grandfather => ("grandfather", "Grandfather"),
        Grandmother => ("grandmother", "Grandmother"),
        Uncle => ("uncle", "Uncle"),
        Aunt => ("aunt", "Aunt"),
        Other => ("other", "Other"),
    }
}

choice_enum! {
    /// ABO/Rh blood group.
    BloodGroup, "blood group" {
        APositive => ("A+", "A+"),
        ANegative => ("A-", "A-"),
        BPositive => ("B+", "B+"),
        BNegative => ("B-", "B-"),
        OPositive => ("O+", "O+"),
        ONegative => ("O-", "O-"),
        AbPositive => ("AB+", "AB+"),
        AbNegative => ("AB-", "AB-"),
        Unknown => ("unknown", "Unknown"),
    }
}

impl Default for BloodGroup {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Family member entity. Always owned by exactly one user.
#[derive(Debug, Clone, Serialize)]
pub struct FamilyMember {
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    pub name: String,
    pub relation: Relation,
    pub date_of_birth: Option<NaiveDate>,
    pub blood_group: BloodGroup,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl FamilyMember {
    /// Age in whole years as of `today`.
    ///
    /// The year difference only counts once the birthday has been reached in
    /// `today`'s year. `None` when no date of birth is recorded.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        let dob = self.date_of_birth?;
        let before_birthday = (today.month(), today.day()) < (dob.month(), dob.day());
        Some(today.year() - dob.year() - i32::from(before_birthday))
    }

    /// Age as of the current UTC date
    pub fn age(&self) -> Option<i32> {
        self.age_on(Utc::now().date_naive())
    }
}

impl fmt::Display for FamilyMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.relation.label())
    }
}

/// A member together with the number of health records it owns
#[derive(Debug, Clone, Serialize)]
pub struct MemberWithCount {
    pub member: FamilyMember,
    pub record_count: i64,
}

/// Validated member fields, used for both create and update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInput {
    pub name: String,
    pub relation: Relation,
    pub date_of_birth: Option<NaiveDate>,
    pub blood_group: BloodGroup,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Months;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn member(dob: Option<NaiveDate>) -> FamilyMember {
        FamilyMember {
            id: 1,
            user_id: 1,
            name: "Bob".to_string(),
            relation: Relation::Father,
            date_of_birth: dob,
            blood_group: BloodGroup::default(),
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_birthday_passed() {
        let today = date(2024, 6, 15);
        assert_eq!(member(Some(date(1994, 6, 14))).age_on(today), Some(30));
    }

    #[test]
    fn test_age_birthday_not_yet_reached() {
        let today = date(2024, 6, 15);
        assert_eq!(member(Some(date(1994, 6, 16))).age_on(today), Some(29));
    }

    #[test]
    fn test_age_on_birthday() {
        let today = date(2024, 6, 15);
        assert_eq!(member(Some(date(1994, 6, 15))).age_on(today), Some(30));
    }

    #[test]
    fn test_age_without_date_of_birth() {
        assert_eq!(member(None).age_on(date(2024, 1, 1)), None);
        assert_eq!(member(None).age(), None);
    }

    #[test]
    fn test_display_uses_relation_label() {
        assert_eq!(member(None).to_string(), "Bob (Father)");

        let mut me = member(None);
        me.relation = Relation::Myself;
        assert_eq!(me.to_string(), "Bob (Myself)");
    }

    #[test]
    fn test_relation_value_and_label() {
        assert_eq!(Relation::Myself.value(), "self");
        assert_eq!(Relation::from_str("self").unwrap(), Relation::Myself);
        assert_eq!(Relation::from_str("grandmother").unwrap(), Relation::Grandmother);
        assert!(Relation::from_str("cousin").is_err());
        assert!(Relation::from_str("Father").is_err());
        assert_eq!(Relation::ALL.len(), 13);
    }

    #[test]
    fn test_blood_group_values() {
        assert_eq!(BloodGroup::default(), BloodGroup::Unknown);
        assert_eq!(BloodGroup::from_str("AB-").unwrap(), BloodGroup::AbNegative);
        assert_eq!(BloodGroup::OPositive.to_string(), "O+");
        assert_eq!(BloodGroup::Unknown.label(), "Unknown");
        assert_eq!(BloodGroup::choices().len(), 9);
    }

    #[test]
    fn test_choice_enum_serializes_as_value() {
        let json = serde_json::to_string(&BloodGroup::APositive).unwrap();
        assert_eq!(json, "\"A+\"");
        let parsed: Relation = serde_json::from_str("\"spouse\"").unwrap();
        assert_eq!(parsed, Relation::Spouse);
    }

    proptest! {
        /// On the n-th anniversary the age is exactly n, and one day earlier it is n - 1.
        #[test]
        fn age_increments_on_anniversary(
            year in 1900i32..2000,
            month in 1u32..=12,
            day in 1u32..=28,
            years in 1u32..100,
        ) {
            let dob = date(year, month, day);
            let anniversary = dob.checked_add_months(Months::new(12 * years)).unwrap();
            let eve = anniversary.pred_opt().unwrap();
            let m = member(Some(dob));

            prop_assert_eq!(m.age_on(anniversary), Some(years as i32));
            prop_assert_eq!(m.age_on(eve), Some(years as i32 - 1));
        }
    }
}
