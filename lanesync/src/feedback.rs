use crate::outcome::{FailureReason, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Save,
    Load,
}

/// A message for the operator, styled by tone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub tone: Tone,
}

impl Notice {
    pub fn positive(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tone: Tone::Positive,
        }
    }

    pub fn negative(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tone: Tone::Negative,
        }
    }
}

/// Map a terminal outcome to what the operator sees.
pub fn notice_for(action: Action, outcome: &Outcome) -> Notice {
    match outcome {
        Outcome::Success(confirmation) => Notice::positive(confirmation.clone()),
        Outcome::Failure(reason) => {
            let prefix = match action {
                Action::Save => "Failed to save configuration",
                Action::Load => "Failed to load configuration",
            };
            let detail = match reason {
                FailureReason::NoSystemFound => "the node has no configuration system",
                FailureReason::NoDatastreamFound => "the node has no configuration datastream",
                FailureReason::TransportError => "the node could not be reached or refused the request",
                FailureReason::EmptyResult => "no configuration has been saved on the node yet",
                FailureReason::ParseError => "the stored configuration could not be read",
            };
            Notice::negative(format!("{}: {}", prefix, detail))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use super::*;
    use crate::save::SAVE_CONFIRMATION;

    const REASONS: [FailureReason; 5] = [
        FailureReason::NoSystemFound,
        FailureReason::NoDatastreamFound,
        FailureReason::TransportError,
        FailureReason::EmptyResult,
        FailureReason::ParseError,
    ];

    #[test]
    fn test_success_is_positive() {
        let notice = notice_for(Action::Save, &Outcome::Success(SAVE_CONFIRMATION.to_string()));

        assert_eq!(notice, Notice::positive("OSCAR Configuration Saved"));
    }

    #[test]
    fn test_each_failure_is_distinct_and_negative() {
        for action in [Action::Save, Action::Load] {
            let notices: Vec<Notice> = REASONS
                .iter()
                .map(|reason| notice_for(action, &Outcome::Failure(*reason)))
                .collect();

            assert!(notices.iter().all(|n| n.tone == Tone::Negative));
            let distinct: HashSet<&str> = notices.iter().map(|n| n.message.as_str()).collect();
            assert_eq!(distinct.len(), REASONS.len());
        }
    }

    #[test]
    fn test_action_named_in_failure() {
        let outcome = Outcome::Failure(FailureReason::EmptyResult);

        assert!(notice_for(Action::Save, &outcome).message.starts_with("Failed to save"));
        assert!(notice_for(Action::Load, &outcome).message.starts_with("Failed to load"));
    }
}
