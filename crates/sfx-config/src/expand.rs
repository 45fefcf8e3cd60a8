//! Home directory and environment variable expansion for config values.

use crate::ConfigError;

/// Expand `~`, `${VAR}` and `${VAR:-default}` in `value`.
///
/// `field` names the config entry for error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::full(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: e.to_string(),
        })
}
