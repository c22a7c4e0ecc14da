use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("Please enter a positive number")]
    NotANumber,

    #[error("Please enter a positive number")]
    NotPositive,
}

/// Parse the number of photos the user wants to end up with.
pub fn parse_target_count(input: &str) -> Result<u32, TargetError> {
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|_| TargetError::NotANumber)?;
    if value <= 0 {
        return Err(TargetError::NotPositive);
    }
    u32::try_from(value).map_err(|_| TargetError::NotANumber)
}
