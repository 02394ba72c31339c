//! Integration tests for the `pca-template-preview` binary

#![allow(deprecated)]

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const ID_A: &str = "5c9b7f3e2a1d4e00000000aa";
const ID_B: &str = "5c9b7f3e2a1d4e00000000bb";
const ID_MISSING: &str = "5c9b7f3e2a1d4e00000000ff";

/// Write a store export and a configuration file using `sh` as the compiler
fn setup(dir: &Path) -> PathBuf {
    let documents = [
        r#"{"_id": {"$oid": "5c9b7f3e2a1d4e00000000aa"}, "complexity": 2, "name": "Zeta"}"#,
        r#"{"_id": {"$oid": "5c9b7f3e2a1d4e00000000bb"}, "complexity": 1, "name": "50% Off"}"#,
    ];
    fs::write(dir.join("templates.json"), documents.join("\n")).unwrap();

    let config = dir.join("config.toml");
    fs::write(
        &config,
        r#"
[default]
store = "templates.json"
compiler = "sh"
compiler_args = ['-c', 'cp "$0" template_preview.pdf']

[broken]
store = "missing.json"
"#,
    )
    .unwrap();
    config
}

fn bin() -> Command {
    Command::cargo_bin("pca-template-preview").unwrap()
}

fn pdfs_in(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("PCA_Template_Preview-") && name.ends_with(".pdf"))
        .collect()
}

#[test]
fn test_requires_ids_or_file() {
    bin().assert().failure().code(2);
}

#[test]
fn test_file_and_ids_conflict() {
    let temp = TempDir::new().unwrap();
    let ids = temp.path().join("ids.txt");
    fs::write(&ids, ID_A).unwrap();

    bin()
        .arg("--file")
        .arg(&ids)
        .arg(ID_A)
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_version() {
    bin()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_id_exits_255() {
    let temp = TempDir::new().unwrap();

    bin()
        .current_dir(temp.path())
        .arg("not-an-object-id")
        .assert()
        .failure()
        .code(255)
        .stderr(predicate::str::contains("Template ID is invalid: not-an-object-id"));

    assert!(fs::read_dir(temp.path()).unwrap().next().is_none());
}

#[test]
fn test_empty_id_file_is_not_an_error() {
    let temp = TempDir::new().unwrap();
    let ids = temp.path().join("ids.txt");
    fs::write(&ids, "\n\n").unwrap();

    // No configuration is needed when there is nothing to do
    bin()
        .current_dir(temp.path())
        .arg("--config")
        .arg(temp.path().join("does-not-exist.toml"))
        .arg("--file")
        .arg(&ids)
        .assert()
        .success()
        .stdout(predicate::str::contains("No valid template IDs provided - exiting!"));
}

#[test]
fn test_missing_id_file() {
    let temp = TempDir::new().unwrap();

    bin()
        .arg("--file")
        .arg(temp.path().join("nope.txt"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Could not read template IDs"));
}

#[test]
fn test_unknown_id_exits_255() {
    let data = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    let config = setup(data.path());

    bin()
        .current_dir(home.path())
        .arg("--config")
        .arg(&config)
        .arg(ID_A)
        .arg(ID_MISSING)
        .assert()
        .failure()
        .code(255)
        .stderr(predicate::str::contains(format!(
            "Template ID does not exist in database: {}",
            ID_MISSING
        )));

    assert!(fs::read_dir(home.path()).unwrap().next().is_none());
}

#[test]
fn test_unavailable_store_exits_1() {
    let data = TempDir::new().unwrap();
    let config = setup(data.path());

    bin()
        .arg("--config")
        .arg(&config)
        .arg("--section")
        .arg("broken")
        .arg(ID_A)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Template store unavailable"));
}

#[test]
fn test_unknown_section_exits_1() {
    let data = TempDir::new().unwrap();
    let config = setup(data.path());

    bin()
        .arg("-c")
        .arg(&config)
        .arg("-s")
        .arg("production")
        .arg(ID_A)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("section [production] not found"));
}

#[cfg(unix)]
#[test]
fn test_generates_pdf_in_invocation_dir() {
    let data = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    let config = setup(data.path());
    let ids = data.path().join("ids.txt");
    fs::write(&ids, format!("{}\n{}\n", ID_A, ID_B)).unwrap();

    bin()
        .current_dir(home.path())
        .arg("--config")
        .arg(&config)
        .arg("--file")
        .arg(&ids)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generating Template Preview for 2 templates..."))
        .stdout(predicate::str::contains("Done"));

    let entries: Vec<_> = fs::read_dir(home.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);

    let pdfs = pdfs_in(home.path());
    assert_eq!(pdfs.len(), 1);

    // The fake compiler copies the rendered source, escaped and sorted
    let content = fs::read_to_string(home.path().join(&pdfs[0])).unwrap();
    let alpha = content.find("50\\% Off").expect("escaped name present");
    let zeta = content.find("Zeta").expect("second name present");
    assert!(alpha < zeta);
}

#[cfg(unix)]
#[test]
fn test_debug_keeps_work_dir() {
    let data = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    let config = setup(data.path());

    bin()
        .current_dir(home.path())
        .arg("--debug")
        .arg("--config")
        .arg(&config)
        .arg(ID_A)
        .assert()
        .success()
        .stdout(predicate::str::contains("Intermediate files kept in:"));

    assert!(pdfs_in(home.path()).is_empty());

    let dirs: Vec<PathBuf> = fs::read_dir(home.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_dir())
        .collect();
    assert_eq!(dirs.len(), 1);
    for name in [
        "template_preview.json",
        "template_preview.tex",
        "template_preview.pdf",
        "template_preview.mustache",
    ] {
        assert!(dirs[0].join(name).is_file(), "{} missing", name);
    }
    assert!(dirs[0].join("assets").is_dir());
}

#[cfg(unix)]
#[test]
fn test_compiler_failure_exits_1() {
    let data = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    fs::write(
        data.path().join("templates.json"),
        format!(r#"{{"_id": "{}", "name": "x"}}"#, ID_A),
    )
    .unwrap();
    let config = data.path().join("config.toml");
    fs::write(
        &config,
        "[default]\nstore = \"templates.json\"\ncompiler = \"sh\"\ncompiler_args = [\"-c\", \"exit 1\"]\n",
    )
    .unwrap();

    bin()
        .current_dir(home.path())
        .arg("--config")
        .arg(&config)
        .arg(ID_A)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("sh failed"));

    assert!(fs::read_dir(home.path()).unwrap().next().is_none());
}

#[cfg(unix)]
#[test]
fn test_debug_compiler_diagnostics_on_stdout() {
    let data = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    fs::write(
        data.path().join("templates.json"),
        format!(r#"{{"_id": "{}", "name": "x"}}"#, ID_A),
    )
    .unwrap();
    let config = data.path().join("config.toml");
    fs::write(
        &config,
        "[default]\nstore = \"templates.json\"\ncompiler = \"sh\"\n\
         compiler_args = [\"-c\", \"echo overfull-hbox-warning >&2; cp \\\"$0\\\" template_preview.pdf\"]\n",
    )
    .unwrap();

    bin()
        .current_dir(home.path())
        .env("RUST_LOG", "off")
        .arg("--debug")
        .arg("--config")
        .arg(&config)
        .arg(ID_A)
        .assert()
        .success()
        .stdout(predicate::str::contains("overfull-hbox-warning"))
        .stderr(predicate::str::contains("overfull-hbox-warning").not());
}

#[cfg(unix)]
#[test]
fn test_built_in_resources_without_resources_key() {
    let data = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    let config = setup(data.path());

    bin()
        .current_dir(home.path())
        .arg("--debug")
        .arg("--config")
        .arg(&config)
        .arg(ID_A)
        .assert()
        .success();

    let dirs: Vec<PathBuf> = fs::read_dir(home.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_dir())
        .collect();
    assert_eq!(dirs.len(), 1);
    let template = fs::read_to_string(dirs[0].join("template_preview.mustache")).unwrap();
    assert!(template.contains("\\input{assets/preamble}"));
    assert!(dirs[0].join("assets/preamble.tex").is_file());
}

#[test]
fn test_malformed_mongo_uri_exits_1() {
    let data = TempDir::new().unwrap();
    let config = data.path().join("config.toml");
    fs::write(&config, "[default]\nuri = \"not a uri\"\ndatabase = \"pca\"\n").unwrap();

    bin()
        .arg("--config")
        .arg(&config)
        .arg(ID_A)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Template store unavailable (mongodb pca.templates)"));
}
