pub type CoverplateResult<T> = Result<T, CoverplateError>;

#[derive(thiserror::Error, Debug)]
pub enum CoverplateError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("render error for track {track}: {message}")]
    Render { track: usize, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoverplateError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn render(track: usize, msg: impl Into<String>) -> Self {
        Self::Render {
            track,
            message: msg.into(),
        }
    }

    /// Attach the 1-based track number a failure occurred on.
    ///
    /// Errors that already carry a track number keep it.
    pub fn for_track(self, track: usize) -> Self {
        match self {
            Self::Render { .. } => self,
            other => Self::Render {
                track,
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            CoverplateError::config("x")
                .to_string()
                .contains("configuration error:")
        );
        assert!(CoverplateError::asset("x").to_string().contains("asset error:"));
        assert!(
            CoverplateError::render(3, "x")
                .to_string()
                .contains("render error for track 3:")
        );
    }

    #[test]
    fn for_track_wraps_and_preserves_message() {
        let err = CoverplateError::asset("cover unreadable").for_track(2);
        let s = err.to_string();
        assert!(s.contains("track 2"));
        assert!(s.contains("cover unreadable"));
    }

    #[test]
    fn for_track_keeps_existing_track_number() {
        let err = CoverplateError::render(5, "boom").for_track(2);
        assert!(err.to_string().contains("track 5"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = CoverplateError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
