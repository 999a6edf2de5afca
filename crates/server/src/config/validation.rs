use serde::Deserialize;

/// `[userInputValidation]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UserInputValidationConfig {
    /// Regex bucket names must match. Defaults to [`itemstore_core::validation::DEFAULT_BUCKET_REGEX`].
    pub bucket_format_regex: Option<String>,
    /// Regex owner header values must match, applied after the length check.
    pub owner_format_regex: Option<String>,
    pub owner_length: OwnerLengthConfig,
}

impl Default for UserInputValidationConfig {
    fn default() -> Self {
        Self {
            bucket_format_regex: None,
            owner_format_regex: None,
            owner_length: OwnerLengthConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OwnerLengthConfig {
    pub min: usize,
    pub max: usize,
}

impl Default for OwnerLengthConfig {
    fn default() -> Self {
        Self { min: 10, max: 60 }
    }
}

impl UserInputValidationConfig {
    /// # Errors
    /// Returns an error if either configured regex fails to compile.
    pub fn build(&self) -> Result<itemstore_core::InputValidation, String> {
        let bucket_pattern = self
            .bucket_format_regex
            .as_deref()
            .unwrap_or(itemstore_core::validation::DEFAULT_BUCKET_REGEX);
        itemstore_core::InputValidation::new(
            bucket_pattern,
            self.owner_format_regex.as_deref(),
            self.owner_length.min,
            self.owner_length.max,
        )
        .map_err(|e| e.to_string())
    }
}
