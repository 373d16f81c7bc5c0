//! Configuration validation
//!
//! Rules:
//! - required names are non-empty (function, tables, regions)
//! - batch_limit >= 1, 0 <= grace_fraction <= 1, deadline_ms >= 1
//! - http.host is `host:port` (`:port` allowed)
//! - endpoint overrides are URLs

use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};
use contracts::{ContractError, DispatcherConfig};

/// Validate a DispatcherConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &DispatcherConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_listen_addr(config)?;
    Ok(())
}

/// Run the derived field rules
fn validate_fields(config: &DispatcherConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let (field, message) =
            first_error(&errors, "").unwrap_or_else(|| ("config".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// Flatten nested validation errors into the first `(path, message)`, in field order
fn first_error(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (name, kind) in fields {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(error) = list.first() {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' rule", error.code));
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_error(inner, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_error(inner, &format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

fn validate_listen_addr(config: &DispatcherConfig) -> Result<(), ContractError> {
    config.http.listen_addr().map(|_| ())
}
