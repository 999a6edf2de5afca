use regex::Regex;

use crate::error::ItemError;

/// Length of a valid item id: 64 lowercase hex characters.
pub const ITEM_ID_LEN: usize = 64;

/// Configured shape of the three user-input checks (spec §6.2
/// `userInputValidation.*`). Constructed once at startup and shared across
/// requests.
#[derive(Debug, Clone)]
pub struct InputValidation {
    bucket_regex: Regex,
    owner_regex: Option<Regex>,
    owner_min: usize,
    owner_max: usize,
}

impl InputValidation {
    /// # Errors
    /// Returns [`ItemError::Internal`] if either configured pattern fails to compile.
    pub fn new(
        bucket_pattern: &str,
        owner_pattern: Option<&str>,
        owner_min: usize,
        owner_max: usize,
    ) -> Result<Self, ItemError> {
        let bucket_regex = Regex::new(bucket_pattern)
            .map_err(|e| ItemError::Internal(format!("invalid bucket regex: {e}")))?;
        let owner_regex = owner_pattern
            .map(Regex::new)
            .transpose()
            .map_err(|e| ItemError::Internal(format!("invalid owner regex: {e}")))?;
        Ok(Self {
            bucket_regex,
            owner_regex,
            owner_min,
            owner_max,
        })
    }

    #[must_use]
    pub fn bucket_regex(&self) -> &Regex {
        &self.bucket_regex
    }
}

impl Default for InputValidation {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_REGEX, None, 10, 60).expect("default bucket regex is valid")
    }
}

/// Default bucket pattern: 3-63 chars, lowercase alphanumeric and hyphens,
/// must start and end with an alphanumeric character.
pub const DEFAULT_BUCKET_REGEX: &str = r"^[a-z0-9]([a-z0-9-]{1,61})[a-z0-9]$";

/// Validate a bucket name against the configured pattern.
///
/// # Errors
/// Returns [`ItemError::BadBucket`] if the name does not match.
pub fn validate_bucket(validation: &InputValidation, bucket: &str) -> Result<(), ItemError> {
    if validation.bucket_regex.is_match(bucket) {
        Ok(())
    } else {
        Err(ItemError::BadBucket(format!(
            "bucket '{bucket}' does not match the configured pattern"
        )))
    }
}

/// Validate an item id: exactly 64 lowercase hex characters.
///
/// # Errors
/// Returns [`ItemError::BadId`] if the length or character set is wrong.
pub fn validate_id(id: &str) -> Result<(), ItemError> {
    if id.len() == ITEM_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ItemError::BadId(format!(
            "id must be {ITEM_ID_LEN} lowercase hex characters"
        )))
    }
}

/// Validate an owner header value: empty is always legal (spec §3 "unowned");
/// non-empty values are checked against the configured length range and,
/// if configured, a format regex.
///
/// # Errors
/// Returns [`ItemError::BadOwner`] if a non-empty value is out of range or
/// fails the configured pattern.
pub fn validate_owner(validation: &InputValidation, owner: &str) -> Result<(), ItemError> {
    if owner.is_empty() {
        return Ok(());
    }
    if owner.len() < validation.owner_min || owner.len() > validation.owner_max {
        return Err(ItemError::BadOwner(format!(
            "owner length must be between {} and {} characters",
            validation.owner_min, validation.owner_max
        )));
    }
    if let Some(re) = &validation.owner_regex
        && !re.is_match(owner)
    {
        return Err(ItemError::BadOwner(
            "owner does not match the configured pattern".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex64(fill: char) -> String {
        std::iter::repeat_n(fill, ITEM_ID_LEN).collect()
    }

    #[test]
    fn bucket_validation() {
        let v = InputValidation::default();
        assert!(validate_bucket(&v, "planets").is_ok());
        assert!(validate_bucket(&v, "planets-42").is_ok());
        assert!(validate_bucket(&v, "AB").is_err(), "too short and uppercase");
        assert!(validate_bucket(&v, "-leading-hyphen").is_err());
        assert!(validate_bucket(&v, "trailing-hyphen-").is_err());
    }

    #[test]
    fn id_validation() {
        assert!(validate_id(&hex64('a')).is_ok());
        assert!(validate_id("nothex").is_err());
        assert!(validate_id(&hex64('A')).is_err(), "uppercase hex rejected");
        assert!(validate_id(&hex64('a')[..63]).is_err(), "wrong length");
    }

    #[test]
    fn owner_validation_empty_always_ok() {
        let v = InputValidation::default();
        assert!(validate_owner(&v, "").is_ok());
    }

    #[test]
    fn owner_validation_length_range() {
        let v = InputValidation::default();
        assert!(validate_owner(&v, "short").is_err());
        assert!(validate_owner(&v, &"a".repeat(15)).is_ok());
        assert!(validate_owner(&v, &"a".repeat(100)).is_err());
    }
}
