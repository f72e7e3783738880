use super::*;

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.cache.post_ttl, Duration::from_millis(300_000));
    assert_eq!(settings.database.max_connections.get(), 10);
    assert_eq!(settings.database.acquire_timeout, Duration::from_secs(30));
    assert!(settings.database.url.is_none());
    assert!(!settings.database.run_migrations);
    assert_eq!(settings.logging.level, LevelFilter::WARN);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.cache.post_ttl_ms = Some(60_000);
    raw.logging.level = Some("info".to_string());

    let overrides = SettingsOverrides {
        cache_post_ttl_ms: Some(1_000),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.cache.post_ttl, Duration::from_secs(1));
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn zero_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.post_ttl_ms = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero ttl");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.post_ttl_ms",
            ..
        }
    ));
}

#[test]
fn zero_pool_size_is_rejected() {
    let mut raw = RawSettings::default();
    raw.database.max_connections = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero pool");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "database.max_connections",
            ..
        }
    ));
}

#[test]
fn blank_database_url_is_ignored() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn invalid_log_level_is_reported() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());

    let err = Settings::from_raw(raw).expect_err("bad level");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "logging.level",
            ..
        }
    ));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = SettingsOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn parse_show_with_multiple_ids() {
    let args = CliArgs::parse_from(["quire", "--stats", "show", "3", "3", "7"]);

    assert!(args.stats);
    match args.command {
        Command::Show(show) => assert_eq!(show.ids, vec![3, 3, 7]),
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn parse_sorted_arguments() {
    let args = CliArgs::parse_from(["quire", "sorted", "--limit", "5", "--by", "views"]);

    match args.command {
        Command::Sorted(sorted) => {
            assert_eq!(sorted.limit, 5);
            assert_eq!(sorted.by, "views");
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn parse_create_with_repeated_tags() {
    let args = CliArgs::parse_from([
        "quire",
        "--database-url",
        "postgres://example",
        "create",
        "--owner",
        "1",
        "--title",
        "Hello",
        "--tag",
        "rust",
        "--tag",
        "cache",
    ]);

    assert_eq!(
        args.overrides.database_url.as_deref(),
        Some("postgres://example")
    );
    match args.command {
        Command::Create(create) => {
            assert_eq!(create.owner_id, 1);
            assert_eq!(create.title, "Hello");
            assert_eq!(create.content, "");
            assert_eq!(create.tags, vec!["rust", "cache"]);
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn parse_list_defaults() {
    let args = CliArgs::parse_from(["quire", "--in-memory", "list"]);

    assert!(args.in_memory);
    match args.command {
        Command::List(list) => {
            assert_eq!(list.page, 1);
            assert_eq!(list.page_size, 10);
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}
