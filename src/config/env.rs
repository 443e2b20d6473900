use std::collections::HashMap;

/// Snapshot of the process environment taken once at startup.
///
/// Configuration resolution reads variables from this value instead of the
/// live environment, so it can be built by hand in tests.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Captures the variables of the current process. Non-UTF-8 entries are
    /// skipped.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    /// Returns the value of `name`, treating an empty value as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn get_owned(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    /// Interprets `name` as a boolean toggle (`1`, `true`, `yes`, `on`).
    ///
    /// Returns `None` when the variable is unset.
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_ignores_empty_values() {
        let env: Environment = [("A", "1"), ("B", "")].into_iter().collect();
        assert_eq!(env.get("A"), Some("1"));
        assert_eq!(env.get("B"), None);
        assert_eq!(env.get("C"), None);
    }

    #[test]
    fn test_flag_values() {
        let env: Environment = [
            ("ONE", "1"),
            ("TRUE", "True"),
            ("ZERO", "0"),
            ("NO", "no"),
        ]
        .into_iter()
        .collect();

        assert_eq!(env.flag("ONE"), Some(true));
        assert_eq!(env.flag("TRUE"), Some(true));
        assert_eq!(env.flag("ZERO"), Some(false));
        assert_eq!(env.flag("NO"), Some(false));
        assert_eq!(env.flag("UNSET"), None);
    }
}
