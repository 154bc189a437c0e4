//! Drive the built binary end to end over temp files.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use cardforge_core::png::{Chunk, build_png};

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn cardforge_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_cardforge");
        Command::new(bin_path)
    }

    fn write_base_png(&self) -> PathBuf {
        let png = build_png(&[
            Chunk::new(*b"IHDR", vec![0, 0, 0, 2, 0, 0, 0, 2, 8, 6, 0, 0, 0]),
            Chunk::new(*b"IDAT", vec![0x78, 0x9C, 0x01, 0x02, 0x03, 0x04]),
            Chunk::new(*b"IEND", vec![]),
        ]);
        let path = self.temp_dir.path().join("base.png");
        std::fs::write(&path, png).expect("failed to write base png");
        path
    }

    fn write_card_json(&self) -> PathBuf {
        let path = self.temp_dir.path().join("card.json");
        std::fs::write(
            &path,
            r#"{"spec":"chara_card_v3","spec_version":"3.0","data":{"name":"CLI Test","first_mes":"hello"}}"#,
        )
        .expect("failed to write card json");
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

fn run_ok(cmd: &mut Command) -> String {
    let output = cmd.output().expect("failed to run cardforge");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let stdout = run_ok(ctx.cardforge_cmd().arg("--help"));
    assert!(stdout.contains("Usage:"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    let output = ctx
        .cardforge_cmd()
        .arg("--version")
        .output()
        .expect("failed to run cardforge");
    assert!(output.status.success());
}

#[test]
fn test_embed_inspect_extract_flow() {
    let ctx = TestContext::new();
    let base = ctx.write_base_png();
    let card = ctx.write_card_json();
    let embedded = ctx.path("embedded.png");

    run_ok(ctx.cardforge_cmd().args([
        "embed",
        base.to_str().unwrap(),
        card.to_str().unwrap(),
        "-o",
        embedded.to_str().unwrap(),
    ]));
    assert!(embedded.exists());

    let stdout = run_ok(ctx.cardforge_cmd().args(["inspect", embedded.to_str().unwrap()]));
    assert!(stdout.contains("CLI Test"));
    assert!(stdout.contains("ccv3"));

    let extracted = ctx.path("extracted.json");
    run_ok(ctx.cardforge_cmd().args([
        "extract",
        embedded.to_str().unwrap(),
        "-o",
        extracted.to_str().unwrap(),
    ]));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&extracted).unwrap()).unwrap();
    assert_eq!(json["data"]["name"], "CLI Test");
}

#[test]
fn test_strip_removes_card() {
    let ctx = TestContext::new();
    let base = ctx.write_base_png();
    let card = ctx.write_card_json();
    let embedded = ctx.path("embedded.png");
    let stripped = ctx.path("stripped.png");

    run_ok(ctx.cardforge_cmd().args([
        "embed",
        base.to_str().unwrap(),
        card.to_str().unwrap(),
        "-o",
        embedded.to_str().unwrap(),
    ]));
    run_ok(ctx.cardforge_cmd().args([
        "strip",
        embedded.to_str().unwrap(),
        "-o",
        stripped.to_str().unwrap(),
    ]));

    let stdout = run_ok(ctx.cardforge_cmd().args(["inspect", stripped.to_str().unwrap()]));
    assert!(stdout.contains("no card data"));
    // pixel bytes unchanged relative to the base image
    assert_eq!(inspect_idat(&stripped), inspect_idat(&base));
}

fn inspect_idat(path: &Path) -> Vec<Vec<u8>> {
    let bytes = std::fs::read(path).unwrap();
    cardforge_core::png::extract_idat(&bytes).unwrap()
}

#[test]
fn test_check_url_blocks_private() {
    let ctx = TestContext::new();
    let output = ctx
        .cardforge_cmd()
        .args(["check-url", "http://192.168.1.1:8080/"])
        .output()
        .expect("failed to run cardforge");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("blocked"));
}

#[test]
fn test_check_url_allows_localhost_flag() {
    let ctx = TestContext::new();
    let stdout = run_ok(ctx.cardforge_cmd().args([
        "check-url",
        "http://localhost:11434/",
        "--allow-localhost",
    ]));
    assert!(stdout.contains("allowed"));
}
