/// User-correctable input validation errors, surfaced verbatim.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("gestational week must be between 20 and 37 for premature subjects, got {0:?}")]
    InvalidGestationalWeek(Option<u8>),
}
