// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

/// Collects non-fatal warnings during deployment operations.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// No container image matched the requested image.
    pub fn unmatched_image(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::UnmatchedImage,
            message: message.into(),
        }
    }

    /// An old revision could not be deregistered.
    pub fn prune_failed(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::PruneFailed,
            message: message.into(),
        }
    }

    /// Rollback was requested but could not be attempted.
    pub fn rollback_skipped(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::RollbackSkipped,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The image rewrite changed no container.
    UnmatchedImage,
    /// Deregistering an old revision failed (it stays ACTIVE).
    PruneFailed,
    /// A timed-out forced redeploy has no earlier revision to restore.
    RollbackSkipped,
}
