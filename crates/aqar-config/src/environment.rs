//! Deployment mode.
//!
//! `APP_ENV=development` enables diagnostic detail (error traces) in API
//! responses. Anything else, including an unset variable, is production.

/// The mode the server runs in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    /// Reads `APP_ENV` from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(crate::env_lookup)
    }

    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("APP_ENV").as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("development") || v.eq_ignore_ascii_case("dev") => {
                Self::Development
            }
            _ => Self::Production,
        }
    }

    /// Whether error responses may carry internal traces.
    #[must_use]
    pub fn exposes_error_traces(self) -> bool {
        self == Self::Development
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_is_production() {
        let env = Environment::from_lookup(|_| None);
        assert_eq!(env, Environment::Production);
        assert!(!env.exposes_error_traces());
    }

    #[test]
    fn test_development() {
        let env = Environment::from_lookup(|_| Some("Development".to_string()));
        assert_eq!(env, Environment::Development);
        assert!(env.exposes_error_traces());
    }

    #[test]
    fn test_unknown_value_is_production() {
        let env = Environment::from_lookup(|_| Some("staging".to_string()));
        assert_eq!(env, Environment::Production);
        assert_eq!(env.as_str(), "production");
    }
}
