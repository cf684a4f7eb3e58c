use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const INDEX: &str =
    r#"<ul>{% for link in links %}<li><a href="{{ link }}/index.html">{{ link }}</a></li>{% endfor %}</ul>"#;

const WELCOME_MJML: &str = r#"<mjml>
  <mj-body>
    <mj-section>
      <mj-column>
        <mj-text>Welcome aboard</mj-text>
      </mj-column>
    </mj-section>
  </mj-body>
</mjml>"#;

const LOGO: &[u8] = b"\x89PNG\r\n\x1a\nnot really a png";

/// A project with one email template and a boilerplate skeleton.
fn project() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let write = |path: &str, contents: &[u8]| {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    };

    write("src/index.tera", INDEX.as_bytes());

    write("src/boilerplate/index.mjml", WELCOME_MJML.as_bytes());
    write("src/boilerplate/index.tera", b"<p>{{ title }}</p>\n");
    write("src/boilerplate/data.json", br#"{ "title": "New email" }"#);
    write("src/boilerplate/styles/main.css", b"p { color: #333; }\n");
    write("src/boilerplate/img/logo.png", LOGO);

    write("src/emails/welcome/index.mjml", WELCOME_MJML.as_bytes());
    write("src/emails/welcome/img/logo.png", LOGO);

    tmp
}

fn mailkit(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mailkit").unwrap();
    cmd.current_dir(root).env_remove("RUST_LOG");
    cmd
}

fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Every file below `dir`, relative to it, sorted.
fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    collect_files(dir, dir, &mut out);
    out.sort();
    out
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect_files(root, &path, out);
        } else {
            out.push(path.strip_prefix(root).unwrap().to_path_buf());
        }
    }
}

#[test]
fn boilerplate_without_name_is_a_usage_error() -> TestResult {
    let tmp = project();

    mailkit(tmp.path())
        .arg("boilerplate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--name"));

    assert_eq!(dir_names(&tmp.path().join("src/emails")), vec!["welcome"]);
    Ok(())
}

#[test]
fn boilerplate_copies_every_skeleton_file() -> TestResult {
    let tmp = project();

    mailkit(tmp.path())
        .args(["boilerplate", "--name", "promo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created template promo"));

    let skeleton = tmp.path().join("src/boilerplate");
    let promo = tmp.path().join("src/emails/promo");
    let files = files_under(&skeleton);
    assert_eq!(files.len(), 5);
    assert_eq!(files_under(&promo), files);
    for file in files {
        assert_eq!(fs::read(skeleton.join(&file))?, fs::read(promo.join(&file))?);
    }
    Ok(())
}

#[test]
fn boilerplate_creates_the_emails_directory() -> TestResult {
    let tmp = project();
    fs::remove_dir_all(tmp.path().join("src/emails"))?;

    mailkit(tmp.path())
        .args(["boilerplate", "--name", "promo"])
        .assert()
        .success();

    assert_eq!(dir_names(&tmp.path().join("src/emails")), vec!["promo"]);
    Ok(())
}

#[test]
fn boilerplate_refuses_to_overwrite_without_force() -> TestResult {
    let tmp = project();
    let mjml = tmp.path().join("src/emails/welcome/index.mjml");
    fs::write(&mjml, "edited")?;

    mailkit(tmp.path())
        .args(["boilerplate", "--name", "welcome"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&mjml)?, "edited");

    mailkit(tmp.path())
        .args(["boilerplate", "--name", "welcome", "--force"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&mjml)?, WELCOME_MJML);
    Ok(())
}

#[test]
fn build_produces_the_output_layout() -> TestResult {
    let tmp = project();
    let dist = tmp.path().join("dist");
    fs::create_dir_all(dist.join("stale"))?;
    fs::write(dist.join("stale/index.html"), "old")?;

    mailkit(tmp.path()).arg("build").assert().success();

    assert_eq!(dir_names(&dist), vec!["index.html", "welcome"]);
    assert_eq!(
        files_under(&dist.join("welcome")),
        vec![PathBuf::from("img/logo.png"), PathBuf::from("index.html")]
    );

    let index = fs::read_to_string(dist.join("index.html"))?;
    assert_eq!(index.matches("<a href=").count(), 1);
    assert!(index.contains(r#"href="welcome/index.html""#));

    let html = fs::read_to_string(dist.join("welcome/index.html"))?;
    assert!(html.contains("Welcome aboard"));
    assert_eq!(fs::read(dist.join("welcome/img/logo.png"))?, LOGO);
    Ok(())
}

#[test]
fn build_reports_a_broken_template_and_still_builds_the_rest() -> TestResult {
    let tmp = project();
    let broken = tmp.path().join("src/emails/broken");
    fs::create_dir_all(&broken)?;
    fs::write(broken.join("index.mjml"), "<mjml><mj-body><mj-section>")?;

    mailkit(tmp.path())
        .arg("build")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("broken"));

    assert!(tmp.path().join("dist/welcome/index.html").is_file());
    assert!(!tmp.path().join("dist/broken/index.html").exists());
    Ok(())
}

#[test]
fn config_file_moves_the_output_tree() -> TestResult {
    let tmp = project();
    fs::write(
        tmp.path().join("mailkit.toml"),
        "[paths]\ndist = \"./public\"\nzips = \"./public/ZIPS\"\n",
    )?;

    mailkit(tmp.path()).arg("build").assert().success();

    assert!(tmp.path().join("public/welcome/index.html").is_file());
    assert!(!tmp.path().join("dist").exists());
    Ok(())
}

#[test]
fn zip_archives_each_built_template() -> TestResult {
    let tmp = project();
    mailkit(tmp.path()).arg("build").assert().success();

    mailkit(tmp.path())
        .arg("zip")
        .assert()
        .success()
        .stdout(predicate::str::contains("welcome.zip"));

    assert!(tmp.path().join("dist/ZIPS/welcome.zip").is_file());
    Ok(())
}

#[test]
fn zip_failures_do_not_fail_the_command() -> TestResult {
    let tmp = project();

    mailkit(tmp.path())
        .arg("zip")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 archives could not be created"));

    assert!(!tmp.path().join("dist/ZIPS/welcome.zip").exists());
    Ok(())
}

#[test]
fn pages_render_data_and_inline_styles() -> TestResult {
    let tmp = project();
    let welcome = tmp.path().join("src/emails/welcome");
    fs::create_dir_all(welcome.join("styles"))?;
    fs::write(welcome.join("styles/main.css"), "p { color: red; }")?;
    fs::write(welcome.join("data.json"), r#"{ "name": "Ada" }"#)?;
    fs::write(
        welcome.join("index.tera"),
        r#"<html><head><link rel="stylesheet" href="src/emails/welcome/styles/main.css"></head><body><p>Hi {{ name }}</p></body></html>"#,
    )?;

    mailkit(tmp.path()).arg("pages").assert().success();

    let html = fs::read_to_string(tmp.path().join("dist/welcome/index.html"))?;
    assert!(html.contains("Hi Ada"));
    assert!(!html.contains("<link"));
    assert!(html.contains("<p style=\""));
    Ok(())
}

#[test]
fn lint_fails_on_errors_and_prints_the_report() -> TestResult {
    let tmp = project();
    let welcome = tmp.path().join("src/emails/welcome");
    fs::write(welcome.join("index.tera"), "<p>\n  <img src=\"logo.png\">\n</p>\n")?;

    mailkit(tmp.path())
        .arg("lint")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("img-alt"))
        .stdout(predicate::str::contains("1 errors"));
    Ok(())
}

#[test]
fn lint_errors_pass_when_disabled_from_the_environment() -> TestResult {
    let tmp = project();
    let welcome = tmp.path().join("src/emails/welcome");
    fs::write(welcome.join("index.tera"), "<p><img src=\"logo.png\"></p>\n")?;

    mailkit(tmp.path())
        .arg("lint")
        .env("MAILKIT_LINT__FAIL_AFTER_ERROR", "false")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 errors"));
    Ok(())
}

#[test]
fn lint_passes_on_clean_sources() -> TestResult {
    let tmp = project();

    mailkit(tmp.path())
        .arg("lint")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 errors, 0 warnings"));
    Ok(())
}

#[test]
fn clean_removes_the_output_tree() -> TestResult {
    let tmp = project();
    mailkit(tmp.path()).arg("build").assert().success();
    assert!(tmp.path().join("dist").is_dir());

    mailkit(tmp.path()).arg("clean").assert().success();
    assert!(!tmp.path().join("dist").exists());

    mailkit(tmp.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to clean"));
    Ok(())
}

#[test]
fn missing_emails_directory_is_fatal() -> TestResult {
    let tmp = tempfile::tempdir()?;

    mailkit(tmp.path())
        .arg("build")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not discover email templates"));
    Ok(())
}

#[test]
fn dev_exits_when_the_port_is_taken() -> TestResult {
    let tmp = project();
    let taken = std::net::TcpListener::bind("127.0.0.1:0")?;
    let port = taken.local_addr()?.port().to_string();

    mailkit(tmp.path())
        .args(["dev", "--port", &port])
        .timeout(std::time::Duration::from_secs(60))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to bind"));
    Ok(())
}
