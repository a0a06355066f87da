//! Analysis configuration.
//!
//! [`AnalysisOptions`] is a builder that threads report-shaping and
//! scheduling settings through the analysis entry points without
//! polluting every function signature.
//!
//! # Example
//!
//! ```
//! use mediastruct::AnalysisOptions;
//!
//! let options = AnalysisOptions::new()
//!     .with_frame_tables(false)
//!     .with_asset_marker("adbreak")
//!     .with_parallel(true);
//! assert!(!options.include_frame_tables);
//! assert_eq!(options.asset_marker, "adbreak");
//! ```

/// Marker searched for in segment media templates to recognise ad periods.
pub const DEFAULT_ASSET_MARKER: &str = "asset";

/// Configuration for analysis operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Emit the reduced per-frame tables in stream reports. The GOP table
    /// and stream info are always emitted. Defaults to `true`.
    pub include_frame_tables: bool,
    /// Substring of a segment `media` template that marks a period as an ad
    /// period. Defaults to [`DEFAULT_ASSET_MARKER`].
    pub asset_marker: String,
    /// Analyze independent units (manifest periods, batch probe inputs) on
    /// the rayon pool. Only takes effect with the `rayon` feature; output
    /// order is the input order either way. Defaults to `false`.
    pub parallel: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            include_frame_tables: true,
            asset_marker: DEFAULT_ASSET_MARKER.to_string(),
            parallel: false,
        }
    }
}

impl AnalysisOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether reduced per-frame tables are emitted.
    #[must_use]
    pub fn with_frame_tables(mut self, include: bool) -> Self {
        self.include_frame_tables = include;
        self
    }

    /// Set the ad-period marker.
    #[must_use]
    pub fn with_asset_marker(mut self, marker: impl Into<String>) -> Self {
        self.asset_marker = marker.into();
        self
    }

    /// Set whether independent units are analyzed in parallel.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Whether parallel analysis will actually happen in this build.
    pub(crate) fn runs_parallel(&self) -> bool {
        self.parallel && cfg!(feature = "rayon")
    }
}
