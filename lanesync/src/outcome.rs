use std::fmt;

/// Why a save or load ended without applying anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// The node has no configuration system
    NoSystemFound,
    /// The configuration system has no datastream
    NoDatastreamFound,
    /// Network failure or a non-2xx answer
    TransportError,
    /// The datastream holds no observations yet
    EmptyResult,
    /// The latest observation does not look like a configuration snapshot
    ParseError,
}

impl FailureReason {
    /// Absence conditions are normal on a freshly provisioned node and are not
    /// logged as faults.
    pub fn is_expected(self) -> bool {
        matches!(
            self,
            FailureReason::NoSystemFound | FailureReason::NoDatastreamFound | FailureReason::EmptyResult
        )
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureReason::NoSystemFound => "no configuration system found",
            FailureReason::NoDatastreamFound => "no configuration datastream found",
            FailureReason::TransportError => "the node could not be reached",
            FailureReason::EmptyResult => "no saved configuration exists yet",
            FailureReason::ParseError => "the saved configuration is unreadable",
        };
        f.write_str(text)
    }
}

/// Terminal result of a save or load run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(FailureReason),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn failure(&self) -> Option<FailureReason> {
        match self {
            Outcome::Failure(reason) => Some(*reason),
            Outcome::Success(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_reasons() {
        assert!(FailureReason::NoSystemFound.is_expected());
        assert!(FailureReason::NoDatastreamFound.is_expected());
        assert!(FailureReason::EmptyResult.is_expected());
        assert!(!FailureReason::TransportError.is_expected());
        assert!(!FailureReason::ParseError.is_expected());
    }

    #[test]
    fn test_failure_accessor() {
        assert_eq!(Outcome::Success("ok".to_string()).failure(), None);
        assert_eq!(
            Outcome::Failure(FailureReason::ParseError).failure(),
            Some(FailureReason::ParseError)
        );
    }
}
