use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DracoError {
    #[error("Buffer underflow: {0}")]
    BufferUnderflow(String),
    #[error("Buffer overflow: {0}")]
    BufferOverflow(String),
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    #[error("Corrupt stream: {0}")]
    CorruptStream(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Internal invariant violation: {0}")]
    InternalInvariantViolation(String),
}

pub type Status = Result<(), DracoError>;
pub type StatusOr<T> = Result<T, DracoError>;

pub fn ok_status() -> Status {
    Ok(())
}

pub fn underflow(msg: impl Into<String>) -> DracoError {
    DracoError::BufferUnderflow(msg.into())
}

pub fn corrupt(msg: impl Into<String>) -> DracoError {
    DracoError::CorruptStream(msg.into())
}

/// Debug assert that becomes a recoverable error in release builds.
#[macro_export]
macro_rules! invariant {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            debug_assert!($cond, $msg);
            return Err($crate::status::DracoError::InternalInvariantViolation(
                $msg.to_string(),
            ));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = corrupt("bad symbol");
        assert_eq!(format!("{}", err), "Corrupt stream: bad symbol");
        let err = underflow("need 4 bytes");
        assert_eq!(format!("{}", err), "Buffer underflow: need 4 bytes");
    }
}
