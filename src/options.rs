use crate::parser::DEFAULT_MAX_DEPTH;

/// Source name used when no filename is given.
pub const DEFAULT_FILENAME: &str = "input.fratm";

/// Settings for one [`crate::compile`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Produce a source map alongside the code.
    pub source_map: bool,
    /// Name of the source file, recorded in the source map.
    pub filename: Option<String>,
    /// Embed the source text as `sourcesContent`.
    pub include_source_content: bool,
    /// Parser nesting limit.
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            source_map: false,
            filename: None,
            include_source_content: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CompileOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn source_map(mut self, enabled: bool) -> Self {
        self.source_map = enabled;
        self
    }

    #[must_use]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub const fn include_source_content(mut self, enabled: bool) -> Self {
        self.include_source_content = enabled;
        self
    }

    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// The source name, falling back to [`DEFAULT_FILENAME`].
    #[must_use]
    pub fn source_name(&self) -> &str {
        self.filename.as_deref().unwrap_or(DEFAULT_FILENAME)
    }

    /// Name of the generated file: the source name with its `.fratm`
    /// extension replaced by `.js`.
    #[must_use]
    pub fn output_name(&self) -> String {
        let source = self.source_name();
        let stem = source.strip_suffix(".fratm").unwrap_or(source);
        format!("{stem}.js")
    }
}
