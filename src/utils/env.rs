/// Get environment variable with FXA_ prefix, falling back to unprefixed version
///
/// Checks `FXA_{key}` first, then `{key}`, so deployments can share plain
/// names with other services while still overriding per service.
///
/// # Examples
///
/// ```rust,ignore
/// // Checks FXA_LOG_LEVEL first, then LOG_LEVEL
/// let level = get_env_with_prefix("LOG_LEVEL");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("FXA_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_with_prefix() {
        unsafe {
            std::env::set_var("FXA_UTILS_TEST_VAR", "prefixed_value");
            std::env::set_var("UTILS_TEST_VAR", "unprefixed_value");
        }
        assert_eq!(get_env_with_prefix("UTILS_TEST_VAR"), Some("prefixed_value".to_string()));
        unsafe {
            std::env::remove_var("FXA_UTILS_TEST_VAR");
        }

        // Unprefixed fallback
        assert_eq!(get_env_with_prefix("UTILS_TEST_VAR"), Some("unprefixed_value".to_string()));
        unsafe {
            std::env::remove_var("UTILS_TEST_VAR");
        }

        assert_eq!(get_env_with_prefix("UTILS_NON_EXISTENT_VAR"), None);
    }
}
