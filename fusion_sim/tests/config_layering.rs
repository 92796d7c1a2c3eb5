// fusion_sim/tests/config_layering.rs

use figment::Jail;
use figment::providers::Format;
use std::path::Path;

use fusion_sim::prelude::*;

#[test]
fn file_then_environment_override_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "fusion.toml",
            r#"
            [filter]
            std_a = 0.5
            std_yawdd = 0.4
            degenerate_range = "reject"

            [scenario]
            seed = 7
            "#,
        )?;
        jail.set_env("FUSION_FILTER__STD_A", "1.5");
        jail.set_env("FUSION_SCENARIO__STEPS", "20");

        let config = SimConfig::load(Some(Path::new("fusion.toml"))).map_err(|e| e.to_string())?;

        // Environment beats the file, the file beats the defaults.
        assert_eq!(config.filter.std_a, 1.5);
        assert_eq!(config.filter.std_yawdd, 0.4);
        assert_eq!(config.filter.degenerate_range, DegenerateRangePolicy::Reject);
        assert_eq!(config.filter.std_radr, UkfConfig::default().std_radr);
        assert_eq!(config.scenario.seed, 7);
        assert_eq!(config.scenario.steps, 20);
        Ok(())
    });
}

#[test]
fn defaults_apply_without_a_file() {
    Jail::expect_with(|_jail| {
        let config = SimConfig::load(None).map_err(|e| e.to_string())?;
        assert_eq!(config, SimConfig::default());
        Ok(())
    });
}

#[test]
fn invalid_values_are_reported() {
    Jail::expect_with(|jail| {
        jail.create_file("bad.toml", "[filter]\nstd_laspx = 0.0\n")?;
        let err = SimConfig::load(Some(Path::new("bad.toml"))).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidFilter(ConfigError::NonPositiveStdDev { name: "std_laspx", .. })
        ));

        jail.create_file("off.toml", "[filter]\nuse_laser = false\nuse_radar = false\n")?;
        let err = SimConfig::load(Some(Path::new("off.toml"))).unwrap_err();
        assert!(matches!(err, SimError::InvalidFilter(ConfigError::NoSensorEnabled)));

        jail.create_file("typo.toml", "[scenario]\nsteeps = 3\n")?;
        let err = SimConfig::load(Some(Path::new("typo.toml"))).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
        Ok(())
    });
}

#[test]
fn missing_file_is_an_error() {
    Jail::expect_with(|_jail| {
        let err = SimConfig::load(Some(Path::new("nowhere.toml"))).unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
        Ok(())
    });
}

#[test]
fn shipped_default_file_matches_builtin_defaults() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/default.toml");
    let config: SimConfig = SimConfig::figment(None)
        .merge(figment::providers::Toml::file(&path))
        .extract()
        .unwrap();
    assert_eq!(config, SimConfig::default());
}
