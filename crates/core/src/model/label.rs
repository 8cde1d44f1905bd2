use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when converting raw label values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("invalid label value: {0}")]
    InvalidValue(u8),
}

//
// ─── LABEL ────────────────────────────────────────────────────────────────────
//

/// Binary class assigned to an item.
///
/// The positive class is encoded as 1 and the negative class as 0, matching
/// the dataset encoding. What "positive" reads as on screen ("Real",
/// "Hate speech") is a `Task` concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// Negative class (0): fake article, or non-hateful tweet.
    Negative,
    /// Positive class (1): real article, or hateful tweet.
    Positive,
}

impl Label {
    /// Converts a numeric class value (0 or 1) to a `Label`.
    ///
    /// # Errors
    ///
    /// Returns `LabelError::InvalidValue` if the value is not 0 or 1.
    pub fn from_u8(value: u8) -> Result<Self, LabelError> {
        match value {
            0 => Ok(Self::Negative),
            1 => Ok(Self::Positive),
            _ => Err(LabelError::InvalidValue(value)),
        }
    }

    /// Numeric class value, 0 or 1.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }

    #[must_use]
    pub fn is_positive(self) -> bool {
        matches!(self, Label::Positive)
    }

    /// The other class.
    #[must_use]
    pub fn complement(self) -> Self {
        match self {
            Label::Negative => Label::Positive,
            Label::Positive => Label::Negative,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u8_accepts_binary_values() {
        assert_eq!(Label::from_u8(0).unwrap(), Label::Negative);
        assert_eq!(Label::from_u8(1).unwrap(), Label::Positive);
    }

    #[test]
    fn from_u8_rejects_other_values() {
        let err = Label::from_u8(2).unwrap_err();
        assert_eq!(err, LabelError::InvalidValue(2));
    }

    #[test]
    fn complement_flips_the_class() {
        assert_eq!(Label::Positive.complement(), Label::Negative);
        assert_eq!(Label::Negative.complement(), Label::Positive);
    }
}
