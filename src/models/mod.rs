//! Data models
//!
//! This module contains all data structures used throughout HealthTrack.
//! Models represent:
//! - Database entities (User, Session, FamilyMember, HealthRecord)
//! - Fixed choice sets stored as short machine values with human labels
//! - Validated inputs handed from the form layer to the services

mod family_member;
mod health_record;
mod session;
mod user;

pub use family_member::{BloodGroup, FamilyMember, MemberInput, MemberWithCount, Relation};
pub use health_record::{
    HealthRecord, RecentRecord, RecordCategory, RecordInput, RecordStatus, Severity,
};
pub use session::Session;
pub use user::{CreateUserInput, User};

use serde::Serialize;

/// A single `(value, label)` pair, as offered by a `<select>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

/// Declares a choice enum stored as its machine value.
///
/// Generates `ALL`, `value()`, `label()`, `choices()`, `Display` (the machine
/// value), `FromStr` (exact match on the machine value) and serde impls that
/// go through the machine value.
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => ($value:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in display order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Machine value as stored in the database and submitted by forms
            pub fn value(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            /// Human readable label
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// All variants as `(value, label)` pairs for form rendering
            pub fn choices() -> Vec<$crate::models::Choice> {
                Self::ALL
                    .iter()
                    .map(|c| $crate::models::Choice { value: c.value(), label: c.label() })
                    .collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.value())
            }
        }

        impl std::str::FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    _ => Err(anyhow::anyhow!(concat!("Invalid ", $kind, ": {}"), s)),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.value())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use choice_enum;
