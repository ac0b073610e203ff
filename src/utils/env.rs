use std::str::FromStr;

/// Get environment variable with TIDEWAY_ prefix, falling back to unprefixed version
///
/// `get_env_with_prefix("UNIQUE_REDIS_URL")` checks `TIDEWAY_UNIQUE_REDIS_URL`
/// first, then `UNIQUE_REDIS_URL`.
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("TIDEWAY_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Parse a prefixed environment variable
///
/// Unparseable values are logged and ignored.
pub fn parse_env_with_prefix<T: FromStr>(key: &str) -> Option<T> {
    let raw = get_env_with_prefix(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key = %key, value = %raw, "Ignoring unparseable environment variable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_with_prefix() {
        unsafe {
            std::env::set_var("TIDEWAY_UNIQUE_TEST_VAR", "prefixed_value");
            std::env::set_var("UNIQUE_TEST_VAR", "unprefixed_value");
        }
        assert_eq!(
            get_env_with_prefix("UNIQUE_TEST_VAR"),
            Some("prefixed_value".to_string())
        );
        unsafe {
            std::env::remove_var("TIDEWAY_UNIQUE_TEST_VAR");
        }
        assert_eq!(
            get_env_with_prefix("UNIQUE_TEST_VAR"),
            Some("unprefixed_value".to_string())
        );
        unsafe {
            std::env::remove_var("UNIQUE_TEST_VAR");
        }

        assert_eq!(get_env_with_prefix("UNIQUE_NON_EXISTENT_VAR"), None);
    }

    #[test]
    fn test_parse_env_with_prefix() {
        unsafe {
            std::env::set_var("TIDEWAY_UNIQUE_TEST_NUMBER", "12");
            std::env::set_var("TIDEWAY_UNIQUE_TEST_GARBAGE", "twelve");
        }
        assert_eq!(parse_env_with_prefix::<u32>("UNIQUE_TEST_NUMBER"), Some(12));
        assert_eq!(parse_env_with_prefix::<u32>("UNIQUE_TEST_GARBAGE"), None);
        unsafe {
            std::env::remove_var("TIDEWAY_UNIQUE_TEST_NUMBER");
            std::env::remove_var("TIDEWAY_UNIQUE_TEST_GARBAGE");
        }
    }
}
