/* src/cli/core/src/build/output.rs */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use purr_server::purr_engine::route::decode_segment;

/// File a prerendered path is written to: `/` is `index.html`, anything
/// else `<path>/index.html` with each segment percent-decoded, matching
/// what a static file server looks up.
pub(crate) fn output_path(out_dir: &Path, url_path: &str) -> Result<PathBuf> {
  let mut file = out_dir.to_path_buf();
  for raw in url_path.split('/').filter(|s| !s.is_empty()) {
    let segment = decode_segment(raw);
    if segment.is_empty()
      || segment == "."
      || segment == ".."
      || segment.contains(['/', '\\', '\0'])
    {
      bail!("refusing to write {url_path}: segment '{raw}' is not a plain file name");
    }
    file.push(segment);
  }
  file.push("index.html");
  Ok(file)
}

/// Recursively copy `from` into `to`, returning the number of files copied.
pub(crate) fn copy_dir(from: &Path, to: &Path) -> Result<usize> {
  std::fs::create_dir_all(to).with_context(|| format!("failed to create {}", to.display()))?;
  let mut copied = 0;
  let entries = std::fs::read_dir(from).with_context(|| format!("failed to read {}", from.display()))?;
  for entry in entries {
    let entry = entry?;
    let target = to.join(entry.file_name());
    if entry.file_type()?.is_dir() {
      copied += copy_dir(&entry.path(), &target)?;
    } else {
      std::fs::copy(entry.path(), &target)
        .with_context(|| format!("failed to copy {}", entry.path().display()))?;
      copied += 1;
    }
  }
  Ok(copied)
}
