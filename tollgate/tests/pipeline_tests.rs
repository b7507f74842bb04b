use anyhow::{Context, Result};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Abstraction for managing the tollgate test environment.
struct TollgateTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl TollgateTestEnv {
    /// Copy of demos/sales in a fresh temp directory.
    fn new() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let project_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .context("Workspace root not found")?
            .join("demos/sales");

        let dest = tmp.path().join("sales");
        Self::copy_dir(&project_root, &dest)?;

        Ok(Self {
            _tmp: tmp,
            root: dest,
        })
    }

    fn empty() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().join("fresh");
        fs::create_dir_all(&root)?;
        Ok(Self { _tmp: tmp, root })
    }

    fn copy_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
        let mut options = fs_extra::dir::CopyOptions::new();
        options.skip_exist = true;
        options.content_only = true;

        fs::create_dir_all(dst)?;
        fs_extra::dir::copy(src, dst, &options)
            .map(|_| ())
            .map_err(|e| std::io::Error::other(e.to_string()))
    }

    fn tollgate(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tollgate"));
        cmd.current_dir(&self.root);
        cmd.env_remove("TOLLGATE_DATA_PATH");
        cmd.env_remove("TOLLGATE_LOGS_PATH");
        cmd
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    fn line_count(&self, rel: &str) -> Result<usize> {
        Ok(fs::read_to_string(self.path(rel))?.lines().count())
    }
}

const CLEAN_BATCH: &str = "\
id,date,party_id,item_id,amount,currency
1,2025-07-14,1001,501,150,ARS
2,2025-07-14,1002,502,200,USD
3,2025-07-15,1001,503,42.5,ARS
";

#[test]
fn test_error_batch_is_routed_and_fails_the_run() -> Result<()> {
    let env = TollgateTestEnv::new()?;

    env.tollgate()
        .arg("run")
        .assert()
        .failure()
        .stdout(predicate::str::contains("sales: 5 clean, 5 quarantined"))
        .stderr(predicate::str::contains("FAILURE"));

    // Tiers: header + rows
    assert_eq!(env.line_count("data/silver/sales_silver.csv")?, 6);
    assert_eq!(env.line_count("data/quarantine/sales_quarantine.csv")?, 6);
    assert_eq!(env.line_count("data/gold/sales_gold.csv")?, 6);
    assert_eq!(env.line_count("data/gold/sales_gold_by_party.csv")?, 6);
    assert_eq!(env.line_count("data/gold/sales_gold_daily_by_currency.csv")?, 6);

    let quarantine = fs::read_to_string(env.path("data/quarantine/sales_quarantine.csv"))?;
    assert!(quarantine.lines().next().unwrap_or_default().ends_with("reject_reasons"));
    assert!(quarantine.contains("currency 'XXX' not allowed"));

    assert!(env.path("logs/sales_report.html").exists());
    assert!(env.path("logs/run_results.json").exists());
    // header + one row per finding
    assert_eq!(env.line_count("logs/validation_report.csv")?, 6);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(env.path("logs/sales_report.json"))?)?;
    assert_eq!(report["validation"]["passed"], false);
    let summary = serde_json::to_string_pretty(&serde_json::json!({
        "routing": report["routing"],
        "reject_reasons": report["reject_reasons"],
    }))?;
    insta::assert_snapshot!("sales_routing_summary", summary);

    Ok(())
}

#[test]
fn test_rerun_overwrites_gold_and_appends_report() -> Result<()> {
    let env = TollgateTestEnv::new()?;

    env.tollgate().arg("run").assert().failure();
    let gold_first = fs::read_to_string(env.path("data/gold/sales_gold_by_party.csv"))?;

    env.tollgate().arg("run").assert().failure();
    let gold_second = fs::read_to_string(env.path("data/gold/sales_gold_by_party.csv"))?;

    assert_eq!(gold_first, gold_second);
    assert_eq!(env.line_count("logs/validation_report.csv")?, 11);

    env.tollgate()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Findings per day"));
    Ok(())
}

#[test]
fn test_clean_batch_passes_with_select() -> Result<()> {
    let env = TollgateTestEnv::new()?;
    fs::write(env.path("data/bronze/daily.csv"), CLEAN_BATCH)?;

    env.tollgate()
        .args(["run", "--select", "daily"])
        .assert()
        .success()
        .stdout(predicate::str::contains("daily: 3 clean, 0 quarantined"));

    assert!(!env.path("data/silver/sales_silver.csv").exists());
    // No finding, nothing appended
    assert!(!env.path("logs/validation_report.csv").exists());
    Ok(())
}

#[test]
fn test_missing_dedup_policy_is_fatal() -> Result<()> {
    let env = TollgateTestEnv::new()?;
    fs::remove_file(env.path("config/routing.yml"))?;

    env.tollgate()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate_ids"));

    assert!(!env.path("data/silver").exists());
    Ok(())
}

#[test]
fn test_seed_then_validate() -> Result<()> {
    let env = TollgateTestEnv::empty()?;

    env.tollgate().arg("seed").assert().success();
    assert!(env.path("tollgate.yaml").exists());
    assert!(env.path("data/bronze/sales.csv").exists());

    env.tollgate()
        .args(["validate", "--file", "data/bronze/sales.csv"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("semantic.domain"))
        .stdout(predicate::str::contains("semantic.not_future"));

    env.tollgate()
        .args(["inspect", "--file", "data/bronze/sales.csv", "--limit", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("amount: float"));
    Ok(())
}

#[test]
fn test_clean_keeps_bronze() -> Result<()> {
    let env = TollgateTestEnv::new()?;
    env.tollgate().arg("run").assert().failure();

    env.tollgate().arg("clean").assert().success();

    assert!(!env.path("data/silver").exists());
    assert!(!env.path("logs").exists());
    assert!(env.path("data/bronze/sales.csv").exists());
    Ok(())
}
