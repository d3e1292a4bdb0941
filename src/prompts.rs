//! Prompt template for the remote extraction job.
//!
//! Centralising the template here serves two purposes:
//!
//! 1. **Single source of truth**: the wording sent to the service changes in
//!    exactly one place.
//!
//! 2. **Testability**: unit tests can inspect the template and the binding
//!    rules without issuing a remote call.
//!
//! Callers can override the template via
//! [`crate::config::FlowConfigBuilder::prompt_template`]; the constant here
//! is used when no override is provided. Overrides must keep the
//! [`INPUT_PLACEHOLDER`] so the service knows where to substitute the
//! uploaded data; [`crate::config::FlowConfigBuilder::build`] rejects
//! templates without it.

/// Placeholder the remote service substitutes with the bound input data.
pub const INPUT_PLACEHOLDER: &str = "{input_data}";

/// Default transformation prompt sent with every extraction job.
pub const DEFAULT_PROMPT_TEMPLATE: &str =
    "Extract key information and structure from the following data: {input_data}";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_carries_placeholder() {
        assert!(DEFAULT_PROMPT_TEMPLATE.contains(INPUT_PLACEHOLDER));
    }
}
