/// Aggregated view of session progress, useful for the interactive surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Completed fraction in [0, 1].
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.answered as f64 / self.total as f64
    }

    /// Completed percentage in [0, 100], for progress displays.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }
}
