use crate::utils::error::{BackfillError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<Url> {
    if url_str.is_empty() {
        return Err(BackfillError::config(format!(
            "{}: URL cannot be empty",
            field_name
        )));
    }

    let url = Url::parse(url_str).map_err(|e| {
        BackfillError::config(format!(
            "{}: invalid URL format '{}': {}",
            field_name, url_str, e
        ))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(BackfillError::config(format!(
            "{}: unsupported URL scheme: {}",
            field_name, scheme
        ))),
    }
}

/// Returns the trimmed value, or an error naming the input when it is absent or blank.
pub fn validate_required_input<'a>(field_name: &str, value: Option<&'a str>) -> Result<&'a str> {
    let value = value.ok_or_else(|| {
        BackfillError::config(format!("Input required and not supplied: {}", field_name))
    })?;
    validate_non_empty_string(field_name, value)?;
    Ok(value.trim())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BackfillError::config(format!(
            "Input required and not supplied: {} (value cannot be empty or whitespace-only)",
            field_name
        )));
    }
    Ok(())
}
