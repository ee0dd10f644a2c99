/// What the frame loop does after the drawable could not be acquired.
///
/// Surface errors are never retried within a frame; the next refresh tries
/// again unless the action is [`SurfaceErrorAction::Fatal`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Lost or outdated surface, reconfigured at the current size.
    Reconfigured,
    /// Timeout or unspecified backend error.
    SkipFrame,
    /// Out of memory; the window cannot keep presenting.
    Fatal,
}

impl SurfaceErrorAction {
    pub fn is_fatal(self) -> bool {
        self == SurfaceErrorAction::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fatal_is_fatal() {
        assert!(SurfaceErrorAction::Fatal.is_fatal());
        assert!(!SurfaceErrorAction::Reconfigured.is_fatal());
        assert!(!SurfaceErrorAction::SkipFrame.is_fatal());
    }
}
