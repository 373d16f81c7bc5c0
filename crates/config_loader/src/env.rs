//! Environment variable source
//!
//! Used when no configuration file is readable. Every variable in
//! [`ENV_VARS`] is required; endpoint overrides are optional.

use contracts::{ContractError, DispatcherConfig};
use tracing::error;

pub const DYNAMODB_REGION: &str = "DYNAMODB_REGION";
pub const DYNAMODB_USERS_TABLE: &str = "DYNAMODB_USERS_TABLE";
pub const DYNAMODB_SERVERS_TABLE: &str = "DYNAMODB_SERVERS_TABLE";
pub const DYNAMODB_CHATCONFIG_TABLE: &str = "DYNAMODB_CHATCONFIG_TABLE";
pub const LAMBDA_REGION: &str = "LAMBDA_REGION";
pub const LAMBDA_FUNCTION: &str = "LAMBDA_FUNCTION";
pub const HTTP_HOST: &str = "HTTP_HOST";
pub const DYNAMODB_ENDPOINT: &str = "DYNAMODB_ENDPOINT";
pub const LAMBDA_ENDPOINT: &str = "LAMBDA_ENDPOINT";

/// Required variables, in the order they are checked
pub const ENV_VARS: [&str; 7] = [
    DYNAMODB_REGION,
    DYNAMODB_USERS_TABLE,
    DYNAMODB_SERVERS_TABLE,
    DYNAMODB_CHATCONFIG_TABLE,
    LAMBDA_REGION,
    LAMBDA_FUNCTION,
    HTTP_HOST,
];

/// Build a configuration from a variable lookup
pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<DispatcherConfig, ContractError> {
    let required = |key: &str| -> Result<String, ContractError> {
        match lookup(key).filter(|value| !value.is_empty()) {
            Some(value) => Ok(value),
            None => {
                error!(variable = key, "reading environment config");
                Err(ContractError::config_validation(key, "missing configuration"))
            }
        }
    };
    let optional = |key: &str| lookup(key).filter(|value| !value.is_empty());

    let mut config = DispatcherConfig::default();
    config.directory.region = required(DYNAMODB_REGION)?;
    config.directory.users_table = required(DYNAMODB_USERS_TABLE)?;
    config.directory.servers_table = required(DYNAMODB_SERVERS_TABLE)?;
    config.directory.chat_config_table = required(DYNAMODB_CHATCONFIG_TABLE)?;
    config.invocation.region = required(LAMBDA_REGION)?;
    config.invocation.function = required(LAMBDA_FUNCTION)?;
    config.http.host = required(HTTP_HOST)?;
    config.directory.endpoint = optional(DYNAMODB_ENDPOINT);
    config.invocation.endpoint = optional(LAMBDA_ENDPOINT);

    Ok(config)
}
