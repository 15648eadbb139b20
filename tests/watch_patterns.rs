// tests/watch_patterns.rs

use std::path::{Path, PathBuf};

use notify::event::{AccessKind, CreateKind, ModifyKind};
use notify::{Event, EventKind};

use watch_run::config::model::DEFAULT_EXCLUDES;
use watch_run::errors::WatchRunError;
use watch_run::fs::mock::MockFileSystem;
use watch_run::watch::event_handler::relevant_paths;
use watch_run::watch::path_utils::{display_relative, relative_str};
use watch_run::watch::patterns::split_glob_base;
use watch_run::watch::{WatchMatcher, WatchSpec};

fn spec(paths: &[&str], exclude: &[&str]) -> WatchSpec {
    WatchSpec::new(
        paths.iter().map(|s| s.to_string()).collect(),
        exclude.iter().map(|s| s.to_string()).collect(),
    )
}

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/main.rs", b"fn main() {}");
    fs.add_file("/proj/src/util/mod.rs", b"");
    fs.add_file("/proj/Cargo.toml", b"[package]");
    fs.add_file("/proj/README.md", b"# hi");
    fs
}

fn src_matcher() -> WatchMatcher {
    let fs = MockFileSystem::new();
    fs.add_dir("/proj/src");
    spec(&["src"], &["**/*.swp"])
        .resolve(&fs, Path::new("/proj"))
        .unwrap()
}

#[test]
fn split_glob_base_stops_at_first_glob_component() {
    assert_eq!(
        split_glob_base("src/**/*.rs"),
        (PathBuf::from("src"), Some("src/**/*.rs".to_string()))
    );
    assert_eq!(
        split_glob_base("*.toml"),
        (PathBuf::from("."), Some("*.toml".to_string()))
    );
    assert_eq!(split_glob_base("src/lib"), (PathBuf::from("src/lib"), None));
}

#[test]
fn directories_are_recursive_and_files_watch_their_parent() {
    let fs = project();
    let m = spec(&["src", "Cargo.toml"], &[])
        .resolve(&fs, Path::new("/proj"))
        .unwrap();

    let t = m.targets();
    assert_eq!(t.len(), 2);
    assert_eq!(t[0].path, PathBuf::from("/proj/src"));
    assert!(t[0].recursive);
    assert_eq!(t[0].file, None);

    assert_eq!(t[1].path, PathBuf::from("/proj"));
    assert!(!t[1].recursive);
    assert_eq!(t[1].file, Some(PathBuf::from("/proj/Cargo.toml")));
}

#[test]
fn file_target_accepts_only_that_file_from_its_directory() {
    let fs = project();
    let m = spec(&["Cargo.toml"], &[])
        .resolve(&fs, Path::new("/proj"))
        .unwrap();

    assert_eq!(m.watch_dirs(), vec![(PathBuf::from("/proj"), false)]);

    // An editor's temp file renamed over the target arrives as events on
    // both names; only the target itself counts.
    assert!(m.is_relevant(Path::new("/proj/Cargo.toml")));
    assert!(!m.is_relevant(Path::new("/proj/.Cargo.toml.tmp")));
    assert!(!m.is_relevant(Path::new("/proj/README.md")));
    assert!(!m.is_relevant(Path::new("/proj/src/main.rs")));
}

#[test]
fn watch_dirs_are_deduplicated_under_recursive_roots() {
    let fs = project();
    let m = spec(&["/proj", "src", "Cargo.toml", "src/main.rs"], &[])
        .resolve(&fs, Path::new("/proj"))
        .unwrap();

    assert_eq!(m.targets().len(), 4);
    assert_eq!(m.watch_dirs(), vec![(PathBuf::from("/proj"), true)]);
}

#[test]
fn missing_entries_are_skipped() {
    let fs = project();
    let m = spec(&["src", "benches"], &[])
        .resolve(&fs, Path::new("/proj"))
        .unwrap();
    assert_eq!(m.targets().len(), 1);
}

#[test]
fn nothing_watchable_is_a_config_error() {
    let fs = project();
    let res = spec(&["nope", "also/nope"], &[]).resolve(&fs, Path::new("/proj"));
    assert!(matches!(res, Err(WatchRunError::ConfigError(_))));
}

#[test]
fn invalid_include_glob_is_a_config_error() {
    let fs = project();
    let res = spec(&["src/[*.rs"], &[]).resolve(&fs, Path::new("/proj"));
    assert!(matches!(res, Err(WatchRunError::ConfigError(_))));
}

#[test]
fn relevance_respects_targets_globs_and_excludes() {
    let fs = project();
    let m = spec(&["src/**/*.rs", "Cargo.toml"], &["**/*.swp"])
        .resolve(&fs, Path::new("/proj"))
        .unwrap();

    assert!(m.is_relevant(Path::new("/proj/src/main.rs")));
    assert!(m.is_relevant(Path::new("/proj/src/util/mod.rs")));
    assert!(m.is_relevant(Path::new("/proj/Cargo.toml")));
    assert!(!m.is_relevant(Path::new("/proj/src/notes.txt")));
    assert!(!m.is_relevant(Path::new("/proj/src/.main.rs.swp")));
    assert!(!m.is_relevant(Path::new("/proj/README.md")));
    assert!(!m.is_relevant(Path::new("/elsewhere/src/main.rs")));
}

#[test]
fn default_excludes_drop_build_output_and_vcs_metadata() {
    let fs = project();
    fs.add_file("/proj/target/debug/out", b"");
    fs.add_file("/proj/.git/index", b"");
    let defaults: Vec<&str> = DEFAULT_EXCLUDES.to_vec();
    let m = spec(&["/proj"], &defaults)
        .resolve(&fs, Path::new("/proj"))
        .unwrap();

    assert!(!m.is_relevant(Path::new("/proj/target")));
    assert!(!m.is_relevant(Path::new("/proj/target/debug/out")));
    assert!(!m.is_relevant(Path::new("/proj/src/target/x.rs")));
    assert!(!m.is_relevant(Path::new("/proj/.git")));
    assert!(!m.is_relevant(Path::new("/proj/.git/index")));
    assert!(m.is_relevant(Path::new("/proj/src/main.rs")));
    assert!(m.is_relevant(Path::new("/proj/README.md")));
}

#[test]
fn excludes_ignore_directories_above_the_root() {
    let fs = MockFileSystem::new();
    fs.add_file("/home/me/target/proj/src/main.rs", b"");
    let defaults: Vec<&str> = DEFAULT_EXCLUDES.to_vec();
    let m = spec(&["src"], &defaults)
        .resolve(&fs, Path::new("/home/me/target/proj"))
        .unwrap();

    assert!(m.is_relevant(Path::new("/home/me/target/proj/src/main.rs")));
}

#[test]
fn relative_str_strips_root_prefix() {
    assert_eq!(
        relative_str(Path::new("/proj"), Path::new("/proj/src/a.rs")).as_deref(),
        Some("src/a.rs")
    );
}

#[test]
fn unrelated_path_has_no_relative_form() {
    assert_eq!(
        relative_str(Path::new("/proj-that-does-not-exist"), Path::new("/other/x")),
        None
    );
    assert_eq!(
        display_relative(Path::new("/proj-that-does-not-exist"), Path::new("/other/x")),
        "/other/x"
    );
}

#[test]
fn root_itself_displays_as_given() {
    assert_eq!(display_relative(Path::new("/proj"), Path::new("/proj")), "/proj");
}

#[test]
fn access_events_are_ignored() {
    let ev = Event::new(EventKind::Access(AccessKind::Any)).add_path("/proj/src/a.rs".into());
    assert_eq!(relevant_paths(&ev, &src_matcher()), None);
}

#[test]
fn excluded_paths_are_dropped_from_events() {
    let ev = Event::new(EventKind::Modify(ModifyKind::Any))
        .add_path("/proj/src/.a.rs.swp".into())
        .add_path("/proj/src/a.rs".into());

    assert_eq!(
        relevant_paths(&ev, &src_matcher()),
        Some(vec![PathBuf::from("/proj/src/a.rs")])
    );
}

#[test]
fn event_with_only_excluded_paths_is_ignored() {
    let ev =
        Event::new(EventKind::Create(CreateKind::File)).add_path("/proj/src/.a.rs.swp".into());
    assert_eq!(relevant_paths(&ev, &src_matcher()), None);
}

#[test]
fn pathless_events_pass_through() {
    let ev = Event::new(EventKind::Other);
    assert_eq!(relevant_paths(&ev, &src_matcher()), Some(Vec::new()));
}
