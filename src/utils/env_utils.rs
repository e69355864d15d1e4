use log::debug;
use std::env;

// Prefixes the old web front end used for its build-time variables
const LEGACY_PREFIXES: [&str; 2] = ["VITE_", "REACT_APP_"];

/// Read an environment variable with fallback to a default value
///
/// `INDHIVE_<key>` wins, then the legacy `VITE_<key>` and `REACT_APP_<key>`
/// spellings, then the bare key.
///
/// Arguments:
/// * `key` - The environment variable name without any prefix
/// * `default` - The default value to use if the variable is not found
///
/// Returns:
/// The environment variable value or the default
pub fn read_env(key: &str, default: &str) -> String {
    read_env_with(key, default, |name| env::var(name).ok())
}

/// Read an environment variable and parse it as a `u64`, falling back to `default`
/// when it is missing or not a number.
pub fn read_env_u64(key: &str, default: u64) -> u64 {
    read_env(key, &default.to_string())
        .trim()
        .parse::<u64>()
        .unwrap_or(default)
}

pub(crate) fn read_env_with(
    key: &str,
    default: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    let candidates = std::iter::once(format!("INDHIVE_{key}"))
        .chain(LEGACY_PREFIXES.iter().map(|prefix| format!("{prefix}{key}")))
        .chain(std::iter::once(key.to_string()));

    let mut resolved = None;
    for name in candidates {
        if let Some(value) = lookup(&name).filter(|v| !v.trim().is_empty()) {
            debug!("Environment variable {key} resolved from {name}");
            resolved = Some(value);
            break;
        }
    }

    resolved.unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in<'a>(
        vars: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| vars.get(name).map(|v| (*v).to_string())
    }

    #[test]
    fn test_prefixed_variable_wins() {
        let vars = HashMap::from([
            ("INDHIVE_API_URL", "https://api.indhive.dev"),
            ("VITE_API_URL", "http://vite"),
        ]);
        assert_eq!(
            read_env_with("API_URL", "http://default", lookup_in(&vars)),
            "https://api.indhive.dev"
        );
    }

    #[test]
    fn test_legacy_prefix_fallback() {
        let vars = HashMap::from([("REACT_APP_API_URL", "http://react")]);
        assert_eq!(
            read_env_with("API_URL", "http://default", lookup_in(&vars)),
            "http://react"
        );
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let vars = HashMap::from([("INDHIVE_API_URL", "  ")]);
        assert_eq!(
            read_env_with("API_URL", "http://default", lookup_in(&vars)),
            "http://default"
        );
    }
}
