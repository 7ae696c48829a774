//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the configuration key for error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| env_var_error(field, &e.var_name))
}

/// Like [`expand_env`], but also expands a leading `~` to the home directory.
pub(crate) fn expand_path(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::full(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| env_var_error(field, &e.var_name))
}

fn env_var_error(field: &str, var_name: &str) -> ConfigError {
    ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{var_name}}} not set"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value_unchanged() {
        assert_eq!(expand_env("127.0.0.1", "server.host").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_default_used_when_unset() {
        let value = expand_env("${RELIVE_TEST_SURELY_UNSET_VAR:-0.0.0.0}", "server.host");
        assert_eq!(value.unwrap(), "0.0.0.0");
    }

    #[test]
    fn test_missing_var_is_error() {
        let err = expand_env("${RELIVE_TEST_SURELY_UNSET_VAR}", "server.host").unwrap_err();

        match err {
            ConfigError::EnvVar { field, message } => {
                assert_eq!(field, "server.host");
                assert_eq!(message, "${RELIVE_TEST_SURELY_UNSET_VAR} not set");
            }
            other => panic!("expected EnvVar error, got {other:?}"),
        }
    }

    #[test]
    fn test_expand_path_without_references() {
        assert_eq!(expand_path("public", "serve.root").unwrap(), "public");
    }
}
