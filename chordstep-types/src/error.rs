/// Error returned by configuration-facing operations.
///
/// Both kinds are local and recoverable: the call that produced them is
/// rejected and the previous configuration stays in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainerError {
    /// Out-of-range tempo, octave range or subdivision count.
    InvalidConfiguration(String),
    /// Unrecognised root or quality.
    UnknownChord(String),
}

impl TrainerError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn unknown_chord(msg: impl Into<String>) -> Self {
        Self::UnknownChord(msg.into())
    }
}

impl std::fmt::Display for TrainerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfiguration(msg) => write!(f, "invalid configuration: {}", msg),
            Self::UnknownChord(msg) => write!(f, "unknown chord: {}", msg),
        }
    }
}

impl std::error::Error for TrainerError {}

pub type TrainerResult<T> = Result<T, TrainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_detail() {
        let err = TrainerError::invalid("tempo must be positive");
        assert_eq!(err.to_string(), "invalid configuration: tempo must be positive");

        let err = TrainerError::unknown_chord("H");
        assert_eq!(err.to_string(), "unknown chord: H");
    }
}
