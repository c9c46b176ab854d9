/* src/cli/core/src/build/mod.rs */

mod output;


use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use futures_util::stream;
use purr_server::purr_gateway::GatewayMode;
use purr_server::{RenderOutcome, RenderStatus, Site};

use crate::config::PurrConfig;
use crate::site::build_site;
use crate::ui::{self, DIM, RESET, YELLOW};

pub(crate) use output::{copy_dir, output_path};

/// Path rendered by the catch-all route into `404.html`.
const NOT_FOUND_PATH: &str = "/404";

#[derive(Debug, Clone)]
pub(crate) struct BuildOptions {
  pub out_dir: PathBuf,
  pub concurrency: usize,
  pub fixtures: Option<PathBuf>,
}

impl BuildOptions {
  pub fn from_config(
    config: &PurrConfig,
    out: Option<PathBuf>,
    concurrency: Option<usize>,
    fixtures: Option<PathBuf>,
  ) -> Self {
    Self {
      out_dir: out.unwrap_or_else(|| config.out_dir()),
      concurrency: concurrency.unwrap_or(config.build.concurrency).max(1),
      fixtures,
    }
  }
}

#[derive(Debug, Default)]
pub(crate) struct BuildReport {
  pub written: Vec<String>,
  pub failed: Vec<(String, String)>,
}

pub(crate) async fn run_build(config: &PurrConfig, opts: &BuildOptions) -> Result<BuildReport> {
  let started = Instant::now();
  ui::banner("build", Some(&config.site.name));
  let site = build_site(config, opts.fixtures.as_deref())?;

  ui::step(1, 4, "Resolving static paths");
  let mode = site.gateway().await.mode();
  if mode == GatewayMode::Stub {
    ui::detail(&format!("{YELLOW}warning{RESET}: backend unavailable, dynamic pages are skipped"));
  }
  let paths = site.static_paths().await;
  ui::detail(&format!("{} paths", paths.len()));

  ui::step(2, 4, &format!("Rendering {} pages {DIM}(concurrency {}){RESET}", paths.len(), opts.concurrency));
  std::fs::create_dir_all(&opts.out_dir)
    .with_context(|| format!("failed to create {}", opts.out_dir.display()))?;
  let bar = ui::progress(paths.len() as u64);
  let results: Vec<(String, Result<()>)> = stream::iter(paths.iter().cloned())
    .map(|path| {
      let site = &site;
      let bar = &bar;
      async move {
        let result = write_page(site, &opts.out_dir, &path).await;
        bar.inc(1);
        (path, result)
      }
    })
    .buffer_unordered(opts.concurrency)
    .collect()
    .await;
  bar.finish_and_clear();

  let mut report = BuildReport::default();
  for (path, result) in results {
    match result {
      Ok(()) => report.written.push(path),
      Err(err) => {
        tracing::error!(url = %path, error = %format!("{err:#}"), "page failed to render");
        report.failed.push((path, format!("{err:#}")));
      }
    }
  }
  report.written.sort();
  ui::detail_ok(&format!("{} pages written", report.written.len()));

  ui::step(3, 4, "Rendering 404 page");
  match render_static(&site, NOT_FOUND_PATH).await {
    Ok(html) => {
      write_file(&opts.out_dir.join("404.html"), &html)?;
      ui::detail_ok("404.html");
    }
    Err(err) => report.failed.push((NOT_FOUND_PATH.to_string(), format!("{err:#}"))),
  }

  ui::step(4, 4, "Copying assets");
  let public = config.public_dir();
  if public.is_dir() {
    let copied = copy_dir(&public, &opts.out_dir.join("assets"))?;
    ui::detail_ok(&format!("{copied} files from {}", public.display()));
  } else {
    ui::detail(&format!("{DIM}no public directory at {}{RESET}", public.display()));
  }
  let manifest = serde_json::to_string_pretty(&paths)?;
  write_file(&opts.out_dir.join("paths.json"), &manifest)?;
  ui::detail_ok("paths.json");

  if !report.failed.is_empty() {
    for (path, err) in &report.failed {
      ui::error(&format!("{path}: {err}"));
    }
    bail!("{} of {} pages failed to render", report.failed.len(), paths.len() + 1);
  }
  ui::ok(&format!(
    "built {} pages into {} {DIM}in {:.1}s{RESET}",
    report.written.len() + 1,
    opts.out_dir.display(),
    started.elapsed().as_secs_f64()
  ));
  Ok(report)
}

async fn render_static(site: &Site, path: &str) -> Result<String> {
  match site.render_document(path).await? {
    RenderOutcome::Page { status, html } => {
      if status != RenderStatus::Ok && path != NOT_FOUND_PATH {
        tracing::warn!(url = %path, status = status.http_status(), "prerendered page is not a success page");
      }
      Ok(html)
    }
    RenderOutcome::Redirect { location } => bail!("static render redirected to {location}"),
  }
}

async fn write_page(site: &Site, out_dir: &Path, path: &str) -> Result<()> {
  let html = render_static(site, path).await?;
  let file = output_path(out_dir, path)?;
  write_file(&file, &html)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
  }
  std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
