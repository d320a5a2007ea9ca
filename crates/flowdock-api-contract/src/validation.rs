//! Validation helpers for request options

use validator::Validate;

use crate::error::ApiContractError;
use crate::options::MessageCreateOptions;

/// Unwrap options an endpoint cannot do without, validating them on the way.
pub fn require<'a, T: Validate>(
    options: Option<&'a T>,
    what: &'static str,
) -> Result<&'a T, ApiContractError> {
    let options = options.ok_or(ApiContractError::MissingOptions(what))?;
    options.validate()?;
    Ok(options)
}

/// Validate options for a comment: a regular message plus a parent id.
pub fn validate_comment_options(options: &MessageCreateOptions) -> Result<(), ApiContractError> {
    options.validate()?;

    if options.message.is_none() {
        let mut errors = validator::ValidationErrors::new();
        errors.add(
            "message",
            validator::ValidationError::new("required")
                .with_message("Comment requires a parent message id".into()),
        );
        return Err(ApiContractError::Validation(errors));
    }

    Ok(())
}
