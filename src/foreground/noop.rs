use super::{ForegroundError, ForegroundQuery};

/// Stand-in for targets without a foreground query.
#[derive(Debug, Default)]
pub struct NoopForeground;

impl NoopForeground {
    pub fn new() -> Self {
        Self
    }
}

impl ForegroundQuery for NoopForeground {
    fn query_owner_name(&mut self) -> Result<Option<String>, ForegroundError> {
        Err(ForegroundError::Unavailable(
            "no foreground query on this platform".to_string(),
        ))
    }
}
