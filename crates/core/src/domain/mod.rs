pub mod channel;
pub mod correlation;

use crate::errors::DomainError;

pub const TEAM_ID_MAX_CHARS: usize = 255;
pub const SHORT_FIELD_MAX_CHARS: usize = 55;
pub const REPLY_MESSAGE_MAX_CHARS: usize = 100;
pub const ANALYSED_TEXT_MAX_CHARS: usize = 700;

/// Checks that `value` holds between `min` and `max` characters (not bytes).
pub fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), DomainError> {
    let chars = value.chars().count();
    if chars == 0 && min > 0 {
        return Err(DomainError::MissingField { field });
    }
    if chars < min || chars > max {
        return Err(DomainError::FieldLength { field, min, max });
    }
    Ok(())
}
