//! Integration tests for config

#[cfg(test)]
mod tests {
    use natstage_config::constants::*;
    use natstage_config::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in [
            ENV_EPHEMERAL,
            ENV_TEMP_ROOT,
            ENV_TEMP_PREFIX,
            ENV_WORKING_DIR,
            ENV_REGISTER_SEARCH_PATH,
            ENV_SEARCH_PATH_KEY,
            ENV_EXPORT_ENV,
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.staging.ephemeral);
        assert_eq!(config.staging.temp_prefix, "natstage-");
        assert!(!config.loader.register);
        assert!(!config.loader.export_env);
        assert_eq!(config.temp_root(), std::env::temp_dir());
        assert_eq!(
            config.search_path_key(),
            natstage_platform::native_search_path_key()
        );
    }

    #[test]
    fn test_parse_toml_fragment() {
        let config = Config::from_toml_str(
            r#"
[staging]
ephemeral = false
temp_root = "/var/tmp"

[loader]
register = true
property_key = "JNA_LIBRARY_PATH"
prepend_current_dir = false
            "#,
        )
        .unwrap();

        assert!(!config.staging.ephemeral);
        assert_eq!(config.temp_root(), PathBuf::from("/var/tmp"));
        assert_eq!(config.staging.temp_prefix, "natstage-");
        assert!(config.loader.register);
        assert_eq!(config.search_path_key(), "JNA_LIBRARY_PATH");
        assert!(!config.loader.prepend_current_dir);
    }

    #[test]
    fn test_parse_error() {
        let result = Config::from_toml_str("[staging]\nephemeral = \"maybe\"");
        assert!(matches!(
            result,
            Err(natstage_errors::Error::Config(
                natstage_errors::ConfigError::ParseError { .. }
            ))
        ));
    }

    #[test]
    fn test_toml_values_are_validated() {
        for fragment in [
            "[staging]\ntemp_prefix = \"a/b\"",
            "[loader]\nproperty_key = \"\"",
            "[loader]\nproperty_key = \"A=B\"",
        ] {
            match Config::from_toml_str(fragment) {
                Err(natstage_errors::Error::Config(
                    natstage_errors::ConfigError::InvalidValue { field, .. },
                )) => assert!(field.starts_with("staging.") || field.starts_with("loader.")),
                other => panic!("unexpected result for {fragment:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_validate_struct_literal() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.staging.temp_prefix = "x/".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var(ENV_EPHEMERAL, "no");
        std::env::set_var(ENV_REGISTER_SEARCH_PATH, "1");
        std::env::set_var(ENV_SEARCH_PATH_KEY, "MY_LIB_PATH");
        std::env::set_var(ENV_WORKING_DIR, "/srv/app");

        let config = Config::from_env().unwrap();
        assert!(!config.staging.ephemeral);
        assert!(config.loader.register);
        assert_eq!(config.search_path_key(), "MY_LIB_PATH");
        assert_eq!(config.working_dir().unwrap(), PathBuf::from("/srv/app"));

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var(ENV_EXPORT_ENV, "sometimes");
        let mut config = Config::default();
        assert!(config.merge_env().is_err());
        clear_env();

        std::env::set_var(ENV_TEMP_PREFIX, "a/b");
        assert!(config.merge_env().is_err());
        clear_env();
    }

    #[test]
    fn test_relative_working_dir_is_anchored() {
        let config = Config {
            staging: StagingConfig {
                working_dir: Some(PathBuf::from("libs")),
                ..StagingConfig::default()
            },
            ..Config::default()
        };
        let resolved = config.working_dir().unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("libs"));
    }
}
