//! Architecture Verification Suite
//!
//! Compile-time checks that the pieces shared across tasks stay thread-safe
//! and that the analyzer seam stays object-safe.

#[cfg(test)]
mod architecture_tests {
    use number_analyzer::analysis::{AnalysisError, Analyzer, NumberAnalyzer, NumberProperties, Orchestrator};
    use number_analyzer::server::AppState;

    // The orchestrator is shared by every request handler.
    #[test]
    fn test_core_is_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<Orchestrator>();
        assert_send_sync::<NumberAnalyzer>();
        assert_send_sync::<AppState>();
    }

    // Results and errors cross task boundaries.
    #[test]
    fn test_outcomes_are_sendable() {
        fn assert_send<T: Send + 'static>() {}

        assert_send::<NumberProperties>();
        assert_send::<AnalysisError>();
    }

    #[test]
    fn test_analyzer_is_object_safe() {
        fn assert_analyzer<T: Analyzer + 'static>() {}
        assert_analyzer::<NumberAnalyzer>();

        let _analyzer: std::sync::Arc<dyn Analyzer> = std::sync::Arc::new(NumberAnalyzer::new());
    }

    // AnalysisError must be usable with `?` in anyhow-returning code.
    #[test]
    fn test_errors_convert_to_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(AnalysisError::negative_input())?
        }
        assert_eq!(fails().unwrap_err().to_string(), "Input number cannot be negative.");
    }
}
