//! Module with recipient model compatible with the rows the front end sends.
//! Both naming schemes seen in recipient lists are accepted:
//! `surname`/`otherNames` and `lastName`/`firstName`.
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    #[serde(default, alias = "lastName")]
    pub surname: String,
    #[serde(default, alias = "firstName")]
    pub other_names: String,
    #[serde(default)]
    pub email: String,
}

impl Recipient {
    pub fn new(
        surname: impl Into<String>,
        other_names: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Recipient {
            surname: surname.into(),
            other_names: other_names.into(),
            email: email.into(),
        }
    }

    pub fn has_no_names(&self) -> bool {
        self.surname.is_empty() && self.other_names.is_empty()
    }

    /// Name used in the greeting line, e.g. `Doe John`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.surname, self.other_names)
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} {} {}}}", self.surname, self.other_names, self.email)
    }
}
