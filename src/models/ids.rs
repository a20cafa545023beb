//! Typed identifiers.
//!
//! Every aggregate is addressed by a uuid v4 wrapped in its own newtype so a
//! period id can never be passed where a request id is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

id_type!(
    /// Identifies an employee in the directory.
    EmployeeId
);
id_type!(
    /// Identifies an accrual period.
    PeriodId
);
id_type!(
    /// Identifies a leave request.
    RequestId
);
id_type!(
    /// Identifies an approval record.
    ApprovalId
);
id_type!(
    /// Identifies an issued approval token (never the token secret itself).
    TokenId
);
