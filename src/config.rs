//! Dispatch configuration.

/// Upper bound on drop-and-retry steps taken by an invoke protocol.
///
/// Every retry removes one argument and requires at least three explicit
/// arguments (customizer, target, one more), so the natural bound for a call
/// with `n` arguments is `n - 2` drops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DropLimit {
    /// Bounded only by the argument count.
    #[default]
    ArgumentCount,

    /// At most this many drops per call. `Fixed(0)` disables retrying.
    Fixed(usize),
}

impl DropLimit {
    /// Number of drops admissible for an invoke call with `arg_count`
    /// explicit arguments.
    pub fn allowed(self, arg_count: usize) -> usize {
        let natural = arg_count.saturating_sub(2);
        match self {
            DropLimit::ArgumentCount => natural,
            DropLimit::Fixed(n) => n.min(natural),
        }
    }
}

/// Configuration for a customization point.
///
/// # Examples
///
/// ```
/// use u_dispatch::{DispatchConfig, DropLimit};
///
/// let config = DispatchConfig::default()
///     .with_max_depth(16)
///     .with_drop_limit(DropLimit::Fixed(1));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DispatchConfig {
    /// Maximum nesting of probes into other points (invoke forwarding,
    /// direct calls, retries) during one resolution.
    pub max_depth: usize,

    /// Drop-and-retry bound. Only read by invoke protocol points.
    pub drop_limit: DropLimit,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            drop_limit: DropLimit::ArgumentCount,
        }
    }
}

impl DispatchConfig {
    /// Invoke configuration that never drops a customizer.
    pub fn no_retry() -> Self {
        Self::default().with_drop_limit(DropLimit::Fixed(0))
    }

    /// Sets the maximum nesting of probes and override re-entries.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the drop-and-retry bound.
    pub fn with_drop_limit(mut self, limit: DropLimit) -> Self {
        self.drop_limit = limit;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("max_depth must be at least 1".into());
        }
        Ok(())
    }
}
