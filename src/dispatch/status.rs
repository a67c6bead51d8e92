//! Statuses a conversation turn moves through.

crate::state_enum! {
    #[derive(Copy, Eq, Hash, Default)]
    #[serde(rename_all = "snake_case")]
    pub enum TurnStatus {
        /// Fresh conversation, nothing heard yet
        #[default]
        Start => "start",
        /// A non-blank utterance was transcribed
        Analyzed => "analyzed",
        /// Transcription came back blank
        AnalyzeError => "analyze_error",
        FastpathParsed => "fastpath_parsed",
        LlmParsed => "llm_parsed",
        /// Neither resolver produced anything
        ParseFailed => "parse_failed",
        /// The utterance taught a new rule instead of giving a command
        RuleLearned => "rule_learned",
        Validated => "validated",
        NeedsClarification => "needs_clarification",
        Executed => "executed",
        /// At least one actuator call failed
        HardwareError => "hardware_error",
        /// Nothing to execute
        NoActions => "no_actions",
        HistoryUpdated => "history_updated",
        Continue => "continue",
        TimeoutEnd => "timeout_end",
        UserEnd => "user_end",
        TooManyFailures => "too_many_failures",
        /// Clarification emitted, waiting for the next utterance
        ReadyForNext => "ready_for_next",
    }
    final: [TimeoutEnd, UserEnd, TooManyFailures]
    error: [AnalyzeError, ParseFailed, HardwareError]
}

impl TurnStatus {
    /// Statuses that close a graph pass.
    pub fn ends_pass(self) -> bool {
        matches!(
            self,
            Self::TimeoutEnd | Self::UserEnd | Self::NeedsClarification | Self::TooManyFailures
        )
    }
}

impl std::fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use crate::core::State;
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::State;

    #[test]
    fn names_match_serialized_form() {
        for status in [
            TurnStatus::Start,
            TurnStatus::AnalyzeError,
            TurnStatus::FastpathParsed,
            TurnStatus::LlmParsed,
            TurnStatus::NeedsClarification,
            TurnStatus::TooManyFailures,
            TurnStatus::ReadyForNext,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.name());
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(TurnStatus::UserEnd.is_final());
        assert!(TurnStatus::TimeoutEnd.is_final());
        assert!(TurnStatus::TooManyFailures.is_final());
        assert!(!TurnStatus::NeedsClarification.is_final());
        assert!(TurnStatus::NeedsClarification.ends_pass());
        assert!(!TurnStatus::Continue.ends_pass());
    }

    #[test]
    fn error_statuses() {
        assert!(TurnStatus::HardwareError.is_error());
        assert!(!TurnStatus::Executed.is_error());
    }
}
