//! Validated primitive types shared across the Fisio crates.
//!
//! Each type enforces its invariant at construction and again on deserialisation, so a value
//! read back from a stored document is as trustworthy as one built in code.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
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

    pub fn into_string(self) -> String {
        self.0
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

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Treatment progress as a whole percentage, always within `0..=100`.
///
/// Out-of-range input is clamped rather than rejected: forms and imported documents
/// routinely carry values like `-5` or `120`, and the record must stay usable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Progress(u8);

impl Progress {
    pub const MAX: u8 = 100;

    /// Clamps `value` into `0..=100`.
    pub fn new(value: i64) -> Self {
        Self(value.clamp(0, i64::from(Self::MAX)) as u8)
    }

    /// Clamps and rounds a fractional percentage. `NaN` becomes zero.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self(0);
        }
        Self(value.round().clamp(0.0, f64::from(Self::MAX)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl serde::Serialize for Progress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Progress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Option::<f64>::deserialize(deserializer)?;
        Ok(raw.map(Progress::from_f64).unwrap_or_default())
    }
}

/// Self-reported pain on a 1 to 10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PainLevel(u8);

impl PainLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Clamps `value` into `1..=10`.
    pub fn new(value: i64) -> Self {
        Self(value.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for PainLevel {
    fn default() -> Self {
        Self(5)
    }
}

impl serde::Serialize for PainLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PainLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Option::<f64>::deserialize(deserializer)? {
            Some(raw) if !raw.is_nan() => Ok(PainLevel::new(raw.round() as i64)),
            _ => Ok(PainLevel::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Ana López  ").unwrap();
        assert_eq!(text.as_str(), "Ana López");
    }

    #[test]
    fn test_non_empty_text_rejects_whitespace() {
        assert!(matches!(NonEmptyText::new("   "), Err(TextError::Empty)));
    }

    #[test]
    fn test_non_empty_text_deserialise_rejects_empty() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn test_progress_clamps_out_of_range() {
        assert_eq!(Progress::new(-5).value(), 0);
        assert_eq!(Progress::new(45).value(), 45);
        assert_eq!(Progress::new(250).value(), 100);
        assert_eq!(Progress::from_f64(f64::NAN).value(), 0);
        assert_eq!(Progress::from_f64(99.6).value(), 100);
    }

    #[test]
    fn test_progress_deserialise_clamps() {
        let progress: Progress = serde_json::from_str("130").unwrap();
        assert_eq!(progress.value(), 100);
        let progress: Progress = serde_json::from_str("12.4").unwrap();
        assert_eq!(progress.value(), 12);
    }

    #[test]
    fn test_pain_level_bounds() {
        assert_eq!(PainLevel::new(0).value(), 1);
        assert_eq!(PainLevel::new(11).value(), 10);
        let pain: PainLevel = serde_json::from_str("7").unwrap();
        assert_eq!(pain.value(), 7);
        assert_eq!(serde_json::to_string(&pain).unwrap(), "7");
    }

    #[test]
    fn test_null_numbers_deserialise_to_defaults() {
        let progress: Progress = serde_json::from_str("null").unwrap();
        assert_eq!(progress.value(), 0);
        let pain: PainLevel = serde_json::from_str("null").unwrap();
        assert_eq!(pain, PainLevel::default());
    }
}
