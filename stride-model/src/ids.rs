use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque string identifiers handed to the engine by the rest of the
/// platform. They are never parsed, only compared and stored.
macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(ModelError::InvalidId(format!(
                        "{} cannot be empty",
                        $label
                    )));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(
    /// Learner (platform user) identifier
    LearnerId,
    "learner id"
);
opaque_id!(
    /// Course identifier
    CourseId,
    "course id"
);
opaque_id!(
    /// Identifier of a single consumable unit (lecture, video) in a course
    UnitId,
    "unit id"
);

/// Strongly typed ID for enrollments
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EnrollmentId(pub Uuid);

impl Default for EnrollmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl EnrollmentId {
    pub fn new() -> Self {
        EnrollmentId(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl AsRef<Uuid> for EnrollmentId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite key of a progress record: unique per learner and unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgressKey {
    pub learner_id: LearnerId,
    pub unit_id: UnitId,
}

impl ProgressKey {
    pub fn new(learner_id: LearnerId, unit_id: UnitId) -> Self {
        Self {
            learner_id,
            unit_id,
        }
    }
}
