//! Validation of command parameters. Nothing here touches the network.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

const MAX_REFERENCE_LENGTH: usize = 200;
const MAX_CATEGORY_LENGTH: usize = 100;
const MAX_QUERY_LENGTH: usize = 200;
const MAX_LOCATION_LENGTH: usize = 100;
pub const MAX_INSTRUCTION_LENGTH: usize = 2000;
pub const MAX_QUESTION_LENGTH: usize = 1500;
pub const DEFAULT_LOCATION: &str = "New York";

/// Classical commentators Sefaria indexes as `<Name>_on_<Book>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commentator {
    Rashi,
    IbnEzra,
    Ramban,
    Ralbag,
    Sforno,
    Radak,
}

impl Commentator {
    pub const ALL: [Commentator; 6] = [
        Self::Rashi,
        Self::IbnEzra,
        Self::Ramban,
        Self::Ralbag,
        Self::Sforno,
        Self::Radak,
    ];

    /// Parameter spelling.
    pub fn key(self) -> &'static str {
        match self {
            Self::Rashi => "rashi",
            Self::IbnEzra => "ibn_ezra",
            Self::Ramban => "ramban",
            Self::Ralbag => "ralbag",
            Self::Sforno => "sforno",
            Self::Radak => "radak",
        }
    }

    fn ref_prefix(self) -> &'static str {
        match self {
            Self::Rashi => "Rashi_on_",
            Self::IbnEzra => "Ibn_Ezra_on_",
            Self::Ramban => "Ramban_on_",
            Self::Ralbag => "Ralbag_on_",
            Self::Sforno => "Sforno_on_",
            Self::Radak => "Radak_on_",
        }
    }

    /// Sefaria reference of this commentary on `reference`,
    /// e.g. `Genesis 1:1` becomes `Rashi_on_Genesis_1.1`.
    pub fn reference_for(self, reference: &str) -> String {
        format!(
            "{}{}",
            self.ref_prefix(),
            reference.trim().replace(' ', "_").replace(':', ".")
        )
    }

    fn choices() -> String {
        Self::ALL.iter().map(|c| c.key()).collect::<Vec<_>>().join(", ")
    }

    /// Optional commentary parameter; absent, blank or `none` means no commentary.
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Self>, ValidationError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) if v.eq_ignore_ascii_case("none") => Ok(None),
            Some(v) => v.parse().map(Some),
        }
    }
}

impl FromStr for Commentator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.key() == key)
            .ok_or_else(|| {
                ValidationError::new(format!(
                    "Unknown commentator `{}`. Available commentators: {}.",
                    s.trim(),
                    Self::choices()
                ))
            })
    }
}

impl fmt::Display for Commentator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rashi => "Rashi",
            Self::IbnEzra => "Ibn Ezra",
            Self::Ramban => "Ramban",
            Self::Ralbag => "Ralbag",
            Self::Sforno => "Sforno",
            Self::Radak => "Radak",
        };
        f.write_str(name)
    }
}

fn required<'a>(value: &'a str, what: &str, max: usize) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new(format!("Please provide a {what}.")));
    }
    if value.chars().count() > max {
        return Err(ValidationError::new(format!(
            "That {what} is too long (max {max} characters)."
        )));
    }
    Ok(value)
}

/// A text reference such as `Genesis 1:1`. Passed through to Sefaria untouched.
pub fn reference(value: &str) -> Result<&str, ValidationError> {
    required(value, "text reference", MAX_REFERENCE_LENGTH)
}

pub fn search_query(value: &str) -> Result<&str, ValidationError> {
    required(value, "search term", MAX_QUERY_LENGTH)
}

pub fn instruction(value: &str) -> Result<&str, ValidationError> {
    required(value, "prompt", MAX_INSTRUCTION_LENGTH)
}

pub fn question(value: &str) -> Result<&str, ValidationError> {
    required(value, "question", MAX_QUESTION_LENGTH)
}

pub fn location(value: Option<&str>) -> Result<&str, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(DEFAULT_LOCATION),
        Some(v) => required(v, "location", MAX_LOCATION_LENGTH),
    }
}

/// Free-text category filter. Sefaria category names are capitalized, so the
/// first letter of each word is upper-cased.
pub fn category(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let value = required(value, "category", MAX_CATEGORY_LENGTH)?;

    let titled = value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    Ok(Some(titled))
}

/// Gregorian year for the holiday calendar.
pub fn year(value: Option<i32>, current: i32) -> Result<i32, ValidationError> {
    match value {
        None => Ok(current),
        Some(y) if (1000..=3000).contains(&y) => Ok(y),
        Some(y) => Err(ValidationError::new(format!(
            "{y} is out of range. Pick a year between 1000 and 3000."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commentator_parse() {
        assert_eq!("Rashi".parse::<Commentator>().unwrap(), Commentator::Rashi);
        assert_eq!("ibn ezra".parse::<Commentator>().unwrap(), Commentator::IbnEzra);
        assert_eq!("IBN_EZRA".parse::<Commentator>().unwrap(), Commentator::IbnEzra);
        let err = "Maimonides".parse::<Commentator>().unwrap_err();
        assert!(err.message.contains("rashi, ibn_ezra, ramban, ralbag, sforno, radak"));
    }

    #[test]
    fn test_commentator_optional() {
        assert_eq!(Commentator::parse_optional(None).unwrap(), None);
        assert_eq!(Commentator::parse_optional(Some("None")).unwrap(), None);
        assert_eq!(Commentator::parse_optional(Some("ramban")).unwrap(), Some(Commentator::Ramban));
        assert!(Commentator::parse_optional(Some("nobody")).is_err());
    }

    #[test]
    fn test_commentary_reference() {
        assert_eq!(
            Commentator::Rashi.reference_for("Genesis 1:1"),
            "Rashi_on_Genesis_1.1"
        );
        assert_eq!(
            Commentator::IbnEzra.reference_for(" Song of Songs 2:3 "),
            "Ibn_Ezra_on_Song_of_Songs_2.3"
        );
    }

    #[test]
    fn test_reference_validation() {
        assert_eq!(reference("  Berakhot 2a ").unwrap(), "Berakhot 2a");
        assert!(reference("   ").is_err());
        assert!(reference(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_category_title_case() {
        assert_eq!(category(None).unwrap(), None);
        assert_eq!(category(Some("  ")).unwrap(), None);
        assert_eq!(category(Some("talmud")).unwrap().as_deref(), Some("Talmud"));
        assert_eq!(category(Some("second temple")).unwrap().as_deref(), Some("Second Temple"));
        assert!(category(Some(&"a".repeat(101))).is_err());
    }

    #[test]
    fn test_location_default() {
        assert_eq!(location(None).unwrap(), DEFAULT_LOCATION);
        assert_eq!(location(Some("Jerusalem")).unwrap(), "Jerusalem");
    }

    #[test]
    fn test_year_range() {
        assert_eq!(year(None, 2025).unwrap(), 2025);
        assert_eq!(year(Some(2026), 2025).unwrap(), 2026);
        assert!(year(Some(99), 2025).is_err());
    }

    #[test]
    fn test_instruction_limits() {
        assert!(instruction("").is_err());
        assert!(instruction(&"a".repeat(MAX_INSTRUCTION_LENGTH)).is_ok());
        assert!(instruction(&"a".repeat(MAX_INSTRUCTION_LENGTH + 1)).is_err());
    }
}
