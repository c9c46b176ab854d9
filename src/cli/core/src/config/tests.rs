/* src/cli/core/src/config/tests.rs */

use super::*;

fn parse(src: &str) -> PurrConfig {
  toml::from_str(src).unwrap()
}

#[test]
fn empty_file_uses_defaults() {
  let config = parse("");
  assert_eq!(config.site.name, "Purrhaven Rescue");
  assert_eq!(config.gateway.url_env, "PURR_GATEWAY_URL");
  assert_eq!(config.gateway.key_env, "PURR_GATEWAY_KEY");
  assert_eq!(config.gateway.timeout_secs, 10);
  assert_eq!(config.build.out_dir, "dist");
  assert_eq!(config.build.concurrency, 8);
  assert_eq!(config.serve.port, 3000);
  config.validate().unwrap();
}

#[test]
fn sections_override_defaults() {
  let config = parse(
    r#"
[site]
name = "Whisker Haven"
donate_url = "https://example.org/give"

[gateway]
url_env = "BACKEND_URL"
key_env = "BACKEND_KEY"
timeout_secs = 3

[build]
out_dir = "public_html"
concurrency = 2
templates_dir = "theme"

[document]
lang = "fr"
stylesheets = ["/assets/site.css"]
scripts = ["/assets/hydrate.js"]
"#,
  );
  assert_eq!(config.site.name, "Whisker Haven");
  assert_eq!(config.site.tagline, "Cat rescue and adoption");
  assert_eq!(config.site.donate_url.as_deref(), Some("https://example.org/give"));
  assert_eq!(config.gateway.url_env, "BACKEND_URL");
  assert_eq!(config.gateway.probe_table, "cats");
  assert_eq!(config.build.templates_dir.as_deref(), Some("theme"));
  assert_eq!(config.build.public_dir, "public");

  let document = config.document.document_config();
  assert_eq!(document.lang, "fr");
  assert_eq!(document.stylesheets, ["/assets/site.css"]);
  assert_eq!(document.ids.state_id, "__PURR_STATE__");
}

#[test]
fn gateway_config_carries_timeout() {
  let config = parse("[gateway]\ntimeout_secs = 4\nprobe_table = \"budgets\"\nurl_env = \"PURR_TEST_UNSET_URL\"\nkey_env = \"PURR_TEST_UNSET_KEY\"\n");
  let gateway = config.gateway.gateway_config();
  assert_eq!(gateway.timeout.as_secs(), 4);
  assert_eq!(gateway.probe_table, "budgets");
  assert!(gateway.url.is_none());
  assert!(gateway.credentials().is_err());
}

#[test]
fn validation_rejects_bad_values() {
  let err = parse("[build]\nconcurrency = 0\n").validate().unwrap_err();
  assert!(err.to_string().contains("concurrency"));
  let err = parse("[gateway]\ntimeout_secs = 0\n").validate().unwrap_err();
  assert!(err.to_string().contains("timeout_secs"));
  let err = parse("[gateway]\nurl_env = \"\"\n").validate().unwrap_err();
  assert!(err.to_string().contains("url_env"));
}

#[test]
fn finds_config_in_parent_directory() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(dir.path().join(CONFIG_FILE), "[site]\nname = \"Nested\"\n").unwrap();
  let nested = dir.path().join("content/cats");
  std::fs::create_dir_all(&nested).unwrap();

  let found = find_purr_config(&nested).unwrap();
  assert_eq!(found, dir.path().join(CONFIG_FILE));

  let config = load_purr_config(&found).unwrap();
  assert_eq!(config.site.name, "Nested");
  assert_eq!(config.root, dir.path());
  assert_eq!(config.out_dir(), dir.path().join("dist"));
}

#[test]
fn missing_config_is_reported() {
  let dir = tempfile::tempdir().unwrap();
  let err = find_purr_config(dir.path()).unwrap_err();
  assert!(err.to_string().contains(CONFIG_FILE));
}

#[test]
fn invalid_config_names_the_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join(CONFIG_FILE);
  std::fs::write(&path, "[build]\nconcurrency = 0\n").unwrap();
  let err = load_purr_config(&path).unwrap_err();
  assert!(format!("{err:#}").contains("concurrency"));
  assert!(err.to_string().contains("invalid"));
}
