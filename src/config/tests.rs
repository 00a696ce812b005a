use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        blog_pagination: Some(25),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.blog.pagination.get(), 25);
}

#[test]
fn blog_defaults_apply() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.blog.pagination.get(), DEFAULT_PAGINATION);
    assert_eq!(settings.blog.truncwords_count, DEFAULT_TRUNCWORDS_COUNT);
    assert_eq!(settings.blog.default_language.as_str(), "en");
    assert_eq!(settings.blog.timezone, Tz::UTC);
    assert_eq!(
        settings.blog.namespaces,
        vec![BlogNamespace::new("blog", "/blog")]
    );
    assert!(settings.auth.staff_token_digests.is_empty());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_pagination_is_rejected() {
    let mut raw = RawSettings::default();
    raw.blog.pagination = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero page size");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "blog.pagination",
            ..
        }
    ));
}

#[test]
fn unknown_timezone_is_rejected() {
    let mut raw = RawSettings::default();
    raw.blog.timezone = Some("Mars/Olympus".to_string());

    let err = Settings::from_raw(raw).expect_err("bad timezone");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "blog.timezone",
            ..
        }
    ));
}

#[test]
fn timezone_and_languages_are_parsed() {
    let mut raw = RawSettings::default();
    raw.blog.timezone = Some("Europe/Berlin".to_string());
    raw.blog.default_language = Some("de".to_string());
    raw.blog.languages = Some(vec!["en".to_string(), "pt_BR".to_string()]);

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.blog.timezone, chrono_tz::Europe::Berlin);
    assert_eq!(settings.blog.default_language.as_str(), "de");
    let languages: Vec<&str> = settings.blog.languages.iter().map(|l| l.as_str()).collect();
    assert_eq!(languages, ["en", "pt-br"]);
}

#[test]
fn namespaces_must_be_unique() {
    let mut raw = RawSettings::default();
    raw.blog.namespaces = Some(vec![
        RawNamespace {
            name: Some("blog".into()),
            prefix: Some("/blog".into()),
        },
        RawNamespace {
            name: Some("news".into()),
            prefix: Some("/blog/".into()),
        },
    ]);

    let err = Settings::from_raw(raw).expect_err("duplicate prefix");
    assert!(err.to_string().contains("mounted twice"));
}

#[test]
fn namespace_prefix_must_be_absolute() {
    let mut raw = RawSettings::default();
    raw.blog.namespaces = Some(vec![RawNamespace {
        name: Some("blog".into()),
        prefix: Some("blog".into()),
    }]);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn root_namespace_is_allowed() {
    let mut raw = RawSettings::default();
    raw.blog.namespaces = Some(vec![
        RawNamespace {
            name: Some("root".into()),
            prefix: Some("/".into()),
        },
        RawNamespace {
            name: Some("news".into()),
            prefix: Some("/news".into()),
        },
    ]);

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.blog.namespaces[0].prefix, "");
    assert_eq!(settings.blog.namespaces[1].prefix, "/news");
}

#[test]
fn staff_digests_are_hex_decoded() {
    let digest = hex::encode(crate::application::viewer::StaffTokens::digest("secret"));
    let mut raw = RawSettings::default();
    raw.auth.staff_token_sha256 = Some(vec![digest]);

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.auth.staff_token_digests.len(), 1);
    assert_eq!(settings.auth.staff_token_digests[0].len(), 32);

    let mut raw = RawSettings::default();
    raw.auth.staff_token_sha256 = Some(vec!["abcd".to_string()]);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["cms-blog"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from(["cms-blog", "migrate", "--database-url", "postgres://example"]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "cms-blog",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--blog-timezone",
        "Asia/Tokyo",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.blog_timezone.as_deref(), Some("Asia/Tokyo"));
        }
        _ => panic!("wrong command parsed"),
    }
}
