//! Engine limits for resource protection

/// Default wall-clock budget for one query (60s)
pub const DEFAULT_QUERY_TIME_LIMIT_SECS: u64 = 60;

/// Upper bound accepted for the query time limit (1 hour)
pub const MAX_QUERY_TIME_LIMIT_SECS: u64 = 3600;

/// Default maximum nodes in one query result (10000)
pub const DEFAULT_MAX_RESULT_COUNT: usize = 10_000;

/// Default maximum recursion depth for compilation and traversal (50)
pub const DEFAULT_MAX_LEVELS: u32 = 50;

/// Upper bound accepted for the recursion depth (500)
pub const MAX_LEVELS_CEILING: u32 = 500;

/// Validation error type
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    TimeLimitZero,
    TimeLimitTooLarge { secs: u64, max: u64 },
    ResultCountZero,
    MaxLevelsZero,
    MaxLevelsTooLarge { levels: u32, max: u32 },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimeLimitZero => write!(f, "Query time limit must be at least 1 second"),
            Self::TimeLimitTooLarge { secs, max } => {
                write!(f, "Query time limit too large: {}s (max {}s)", secs, max)
            }
            Self::ResultCountZero => write!(f, "Maximum result count must be positive"),
            Self::MaxLevelsZero => write!(f, "Maximum levels must be positive"),
            Self::MaxLevelsTooLarge { levels, max } => {
                write!(f, "Maximum levels too large: {} (max {})", levels, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate query time limit
pub fn validate_time_limit(secs: u64) -> Result<(), ValidationError> {
    if secs == 0 {
        return Err(ValidationError::TimeLimitZero);
    }
    if secs > MAX_QUERY_TIME_LIMIT_SECS {
        return Err(ValidationError::TimeLimitTooLarge {
            secs,
            max: MAX_QUERY_TIME_LIMIT_SECS,
        });
    }
    Ok(())
}

/// Validate max result count
pub fn validate_result_count(count: usize) -> Result<(), ValidationError> {
    if count == 0 {
        return Err(ValidationError::ResultCountZero);
    }
    Ok(())
}

/// Validate max levels
pub fn validate_max_levels(levels: u32) -> Result<(), ValidationError> {
    if levels == 0 {
        return Err(ValidationError::MaxLevelsZero);
    }
    if levels > MAX_LEVELS_CEILING {
        return Err(ValidationError::MaxLevelsTooLarge {
            levels,
            max: MAX_LEVELS_CEILING,
        });
    }
    Ok(())
}
