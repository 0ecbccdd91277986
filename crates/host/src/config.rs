//! Host configuration structures and loaders.
use std::env;
use std::time::Duration;

/// Settings of the console host itself; the runtime has its own
/// [`rank_runtime::RuntimeConfig`].
#[derive(Clone, Debug)]
pub struct HostConfig {
    /// Hint shown to every player on join.
    pub welcome_hint: String,
    pub welcome_hint_duration: Duration,
    /// Simulate an older host whose sessions lack rank name/color fields,
    /// forcing the role-text badge fallback.
    pub legacy_sessions: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            welcome_hint: "Welcome to the server! Please read the rules.".to_string(),
            welcome_hint_duration: Duration::from_secs(7),
            legacy_sessions: false,
        }
    }
}

impl HostConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `WELCOME_HINT` - Join greeting (default: "Welcome to the server! Please read the rules.")
    /// - `WELCOME_HINT_SECS` - How long the greeting is shown (default: 7)
    /// - `LEGACY_SESSIONS` - Sessions without rank properties (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`HostConfig::from_env`] with variables read through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(hint) = lookup("WELCOME_HINT")
            && !hint.trim().is_empty()
        {
            config.welcome_hint = hint;
        }

        if let Some(secs) = read_var::<u64>(&lookup, "WELCOME_HINT_SECS") {
            config.welcome_hint_duration = Duration::from_secs(secs.max(1));
        }

        if let Some(legacy) = read_var::<bool>(&lookup, "LEGACY_SESSIONS") {
            config.legacy_sessions = legacy;
        }

        config
    }
}

fn read_var<T>(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    lookup(key)?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn variables_override_defaults() {
        let config = HostConfig::from_lookup(lookup(&[
            ("WELCOME_HINT", "Be nice."),
            ("WELCOME_HINT_SECS", "3"),
            ("LEGACY_SESSIONS", "true"),
        ]));

        assert_eq!(config.welcome_hint, "Be nice.");
        assert_eq!(config.welcome_hint_duration, Duration::from_secs(3));
        assert!(config.legacy_sessions);
    }

    #[test]
    fn blank_or_invalid_values_keep_defaults() {
        let config = HostConfig::from_lookup(lookup(&[
            ("WELCOME_HINT", "  "),
            ("WELCOME_HINT_SECS", "0"),
            ("LEGACY_SESSIONS", "yes"),
        ]));
        let defaults = HostConfig::default();

        assert_eq!(config.welcome_hint, defaults.welcome_hint);
        assert_eq!(config.welcome_hint_duration, Duration::from_secs(1));
        assert!(!config.legacy_sessions);
    }
}
