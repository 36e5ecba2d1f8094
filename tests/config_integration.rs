use std::path::PathBuf;

use jsx_sandbox::config::{ConfigFlags, ThemeMode, load_config_flags, parse_flag_tokens};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".jsxsandboxrc");
    let content = r"
# comment
--watch

--theme light

--stylesheet https://cdn.example/site.css --debounce-ms 80
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.watch);
    assert_eq!(flags.theme, Some(ThemeMode::Light));
    assert_eq!(
        flags.stylesheet.as_deref(),
        Some("https://cdn.example/site.css")
    );
    assert_eq!(flags.debounce_ms, Some(80));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".jsxsandboxrc");
    std::fs::write(&path, "--watch\n--theme light\n--preview file.html\n").unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "jsx-sandbox".to_string(),
        "--theme".to_string(),
        "dark".to_string(),
        "--perf".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.watch, "file flags should remain enabled");
    assert!(effective.perf, "cli flags should be applied");
    assert_eq!(effective.theme, Some(ThemeMode::Dark), "cli should override theme");
    assert_eq!(
        effective.preview,
        Some(PathBuf::from("file.html")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_global_local_cli_precedence() {
    let global = ConfigFlags {
        debounce_ms: Some(400),
        theme: Some(ThemeMode::Light),
        ..ConfigFlags::default()
    };
    let local = ConfigFlags {
        debounce_ms: Some(200),
        ..ConfigFlags::default()
    };
    let cli = parse_flag_tokens(&["--debounce-ms=50".to_string()]);

    let effective = global.union(&local).union(&cli);
    assert_eq!(effective.debounce_ms(), 50);
    assert_eq!(effective.theme, Some(ThemeMode::Light));
}
