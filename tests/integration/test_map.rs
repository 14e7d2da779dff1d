//! Integration tests for the map run

use crate::helpers::{DEPRECATED_DEPLOYMENT, TestStore, run_kube_remap, run_kube_remap_raw};
use anyhow::Result;

fn args(store: &TestStore, extra: &[&str]) -> Vec<String> {
  let mut args = store.base_args();
  args.extend(extra.iter().map(|s| s.to_string()));
  args
}

#[test]
fn test_map_supersedes_release() -> Result<()> {
  let store = TestStore::new()?;
  store.add_release("web", "prod", 3, DEPRECATED_DEPLOYMENT)?;

  let output = run_kube_remap(&store.path, &args(&store, &["--releases-namespaces", "web.prod"]))?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("web.prod"), "report should name the release: {}", stdout);

  let v3 = store.read_release("web", "prod", 3)?.expect("v3 kept");
  assert_eq!(v3["info"]["status"], "superseded");
  assert!(v3["manifest"].as_str().unwrap().contains("extensions/v1beta1"));

  let v4 = store.read_release("web", "prod", 4)?.expect("v4 created");
  assert_eq!(v4["info"]["status"], "deployed");
  assert_eq!(
    v4["info"]["description"],
    "Kubernetes deprecated API upgrade - DO NOT rollback from this version"
  );
  let manifest = v4["manifest"].as_str().unwrap();
  assert!(manifest.contains("apiVersion: apps/v1\nkind: Deployment"));
  assert!(!manifest.contains("extensions/v1beta1"));
  assert_eq!(v4["chart"], v3["chart"]);

  Ok(())
}

#[test]
fn test_except_namespace_leaves_store_untouched() -> Result<()> {
  let store = TestStore::new()?;
  store.add_release("web", "prod", 3, DEPRECATED_DEPLOYMENT)?;

  run_kube_remap(
    &store.path,
    &args(&store, &["--all-namespaces", "--except-namespaces", "prod"]),
  )?;

  let v3 = store.read_release("web", "prod", 3)?.expect("v3 kept");
  assert_eq!(v3["info"]["status"], "deployed");
  assert!(store.read_release("web", "prod", 4)?.is_none());

  Ok(())
}

#[test]
fn test_dry_run_writes_nothing() -> Result<()> {
  let store = TestStore::new()?;
  store.add_release("web", "prod", 3, DEPRECATED_DEPLOYMENT)?;
  store.add_release("api", "staging", 1, DEPRECATED_DEPLOYMENT)?;

  let output = run_kube_remap(&store.path, &args(&store, &["--dry-run", "-A"]))?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Dry-run"), "dry-run banner expected: {}", stdout);

  assert_eq!(store.read_release("web", "prod", 3)?.unwrap()["info"]["status"], "deployed");
  assert!(store.read_release("web", "prod", 4)?.is_none());
  assert!(store.read_release("api", "staging", 2)?.is_none());

  Ok(())
}

#[test]
fn test_json_report() -> Result<()> {
  let store = TestStore::new()?;
  store.add_release("web", "prod", 3, DEPRECATED_DEPLOYMENT)?;
  store.add_release("svc", "prod", 1, "---\napiVersion: v1\nkind: Service\n")?;
  store.add_release("db", "data", 5, DEPRECATED_DEPLOYMENT)?;

  let output = run_kube_remap(&store.path, &args(&store, &["--namespaces", "prod", "--json"]))?;
  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(report["dry_run"], false);
  let releases = report["releases"].as_array().unwrap();
  assert_eq!(releases.len(), 2);

  let web = releases.iter().find(|r| r["name"] == "web").unwrap();
  assert_eq!(web["outcome"]["status"], "committed");
  assert_eq!(web["outcome"]["new_version"], 4);

  let svc = releases.iter().find(|r| r["name"] == "svc").unwrap();
  assert_eq!(svc["outcome"]["status"], "unchanged");

  assert_eq!(report["excluded"][0]["name"], "db");
  assert!(store.read_release("db", "data", 6)?.is_none());

  Ok(())
}

#[test]
fn test_kube_version_gates_mapping() -> Result<()> {
  let store = TestStore::new()?;
  store.add_release("web", "prod", 3, DEPRECATED_DEPLOYMENT)?;

  run_kube_remap(&store.path, &args(&store, &["-A", "--kube-version", "v1.8"]))?;

  assert!(store.read_release("web", "prod", 4)?.is_none());
  Ok(())
}

#[test]
fn test_invalid_specifier_exits_with_user_error() -> Result<()> {
  let store = TestStore::new()?;
  store.add_release("web", "prod", 3, DEPRECATED_DEPLOYMENT)?;

  let output = run_kube_remap_raw(&store.path, &args(&store, &["--releases-namespaces", "web"]))?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Invalid release specifier 'web'"), "stderr: {}", stderr);
  assert!(store.read_release("web", "prod", 4)?.is_none());

  Ok(())
}

#[test]
fn test_config_file_supplies_storage_dir() -> Result<()> {
  let store = TestStore::new()?;
  store.add_release("web", "prod", 3, DEPRECATED_DEPLOYMENT)?;
  std::fs::write(
    store.path.join("kube-remap.toml"),
    "storage_dir = \"releases\"\nmap_file = \"Map.yaml\"\nnamespaces = [\"prod\"]\n",
  )?;

  run_kube_remap(&store.path, &[])?;

  assert!(store.read_release("web", "prod", 4)?.is_some());
  Ok(())
}

#[test]
fn test_missing_store_exits_with_system_error() -> Result<()> {
  let store = TestStore::new()?;
  let missing = store.path.join("no-such-store").display().to_string();

  let output = run_kube_remap_raw(
    &store.path,
    &[
      "--storage-dir".to_string(),
      missing,
      "--mapfile".to_string(),
      store.map_file().display().to_string(),
      "-A".to_string(),
    ],
  )?;

  assert_eq!(output.status.code(), Some(2));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("failed to list all releases"), "stderr: {}", stderr);
  assert!(stderr.contains("no-such-store"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn test_help_marks_kubeconfig_as_unused_by_mapping() -> Result<()> {
  let store = TestStore::new()?;

  let output = run_kube_remap(&store.path, &["--help".to_string()])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("--kubeconfig"));
  assert!(stdout.contains("never the cluster"), "help: {}", stdout);

  Ok(())
}
