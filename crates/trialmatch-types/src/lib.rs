//! Primitive types shared by the patient extraction, registry and matching crates.

use serde::{Deserialize, Serialize};

/// Errors that can occur when creating validated primitive types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Errors returned when parsing a sex or sex-eligibility value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SexError {
    #[error("unrecognised sex value: {0}")]
    Unrecognised(String),
}

/// A string type that guarantees non-empty content.
///
/// Used for record identifiers (patient ids, registry trial ids) where an empty value
/// would silently collapse distinct records into one output group.
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Administrative sex of a patient.
///
/// Wire values follow FHIR `AdministrativeGender` (`male`, `female`, `other`, `unknown`);
/// parsing is case-insensitive so registry spellings (`MALE`) are accepted too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
    Unknown,
}

impl Sex {
    /// FHIR wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Other => "other",
            Sex::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for Sex {
    type Err = SexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            "other" => Ok(Sex::Other),
            "unknown" => Ok(Sex::Unknown),
            _ => Err(SexError::Unrecognised(s.to_string())),
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sex requirement published by a trial registry (`ALL`, `MALE`, `FEMALE`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SexEligibility {
    #[default]
    All,
    Male,
    Female,
}

impl SexEligibility {
    /// Registry wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            SexEligibility::All => "ALL",
            SexEligibility::Male => "MALE",
            SexEligibility::Female => "FEMALE",
        }
    }

    /// Returns `true` if a patient of the given sex satisfies this requirement.
    ///
    /// `Other` and `Unknown` only satisfy `All`.
    pub fn admits(self, sex: Sex) -> bool {
        match self {
            SexEligibility::All => true,
            SexEligibility::Male => sex == Sex::Male,
            SexEligibility::Female => sex == Sex::Female,
        }
    }
}

impl std::str::FromStr for SexEligibility {
    type Err = SexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(SexEligibility::All),
            "MALE" => Ok(SexEligibility::Male),
            "FEMALE" => Ok(SexEligibility::Female),
            _ => Err(SexError::Unrecognised(s.to_string())),
        }
    }
}

impl std::fmt::Display for SexEligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_rejects_blank() {
        assert_eq!(NonEmptyText::new("  NCT0001 ").unwrap().as_str(), "NCT0001");
        assert!(matches!(NonEmptyText::new("   "), Err(TextError::Empty)));
    }

    #[test]
    fn non_empty_text_deserialize_rejects_empty() {
        let err = serde_json::from_str::<NonEmptyText>("\"\"");
        assert!(err.is_err());
    }

    #[test]
    fn sex_parses_fhir_and_registry_spellings() {
        assert_eq!("female".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!("MALE".parse::<Sex>().unwrap(), Sex::Male);
        assert!("x".parse::<Sex>().is_err());
    }

    #[test]
    fn eligibility_admits_matching_sex_only() {
        assert!(SexEligibility::All.admits(Sex::Unknown));
        assert!(SexEligibility::Female.admits(Sex::Female));
        assert!(!SexEligibility::Female.admits(Sex::Male));
        assert!(!SexEligibility::Male.admits(Sex::Other));
    }

    #[test]
    fn eligibility_serialises_uppercase() {
        let json = serde_json::to_string(&SexEligibility::Female).unwrap();
        assert_eq!(json, "\"FEMALE\"");
        let parsed: SexEligibility = serde_json::from_str("\"ALL\"").unwrap();
        assert_eq!(parsed, SexEligibility::All);
    }
}
