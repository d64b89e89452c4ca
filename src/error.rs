pub type RegattaResult<T> = Result<T, RegattaError>;

#[derive(thiserror::Error, Debug)]
pub enum RegattaError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RegattaError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            RegattaError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(RegattaError::parse("x").to_string().contains("parse error:"));
        assert!(RegattaError::data("x").to_string().contains("data error:"));
        assert!(
            RegattaError::render("x")
                .to_string()
                .contains("render error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = RegattaError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
