/* src/server/core/rust/src/templates.rs */

use std::path::Path;

use purr_injector::TemplateSet;

use crate::errors::SiteError;
use crate::page::PageKind;

pub const ERROR_BOUNDARY: &str = "error_boundary";
pub const GATE: &str = "gate";
pub const SHELL_FILE: &str = "document.html";

const BUILTIN: &[(&str, &str)] = &[
  ("header", include_str!("../templates/header.html")),
  ("footer", include_str!("../templates/footer.html")),
  ("cat_card", include_str!("../templates/cat_card.html")),
  ("unavailable", include_str!("../templates/unavailable.html")),
  ("error_boundary", include_str!("../templates/error_boundary.html")),
  ("gate", include_str!("../templates/gate.html")),
  ("home", include_str!("../templates/home.html")),
  ("cat_list", include_str!("../templates/cat_list.html")),
  ("cat_detail", include_str!("../templates/cat_detail.html")),
  ("news_list", include_str!("../templates/news_list.html")),
  ("news_article", include_str!("../templates/news_article.html")),
  ("transparency", include_str!("../templates/transparency.html")),
  ("donate", include_str!("../templates/donate.html")),
  ("sign_in", include_str!("../templates/sign_in.html")),
  ("admin_dashboard", include_str!("../templates/admin_dashboard.html")),
  ("admin_cats", include_str!("../templates/admin_cats.html")),
  ("not_found", include_str!("../templates/not_found.html")),
];

const BUILTIN_SHELL: &str = include_str!("../templates/document.html");

/// Page templates plus the document shell they are assembled into.
#[derive(Debug)]
pub struct Templates {
  pub set: TemplateSet,
  pub shell: String,
}

impl Templates {
  pub fn builtin() -> Result<Self, SiteError> {
    let mut set = TemplateSet::new();
    for (name, source) in BUILTIN {
      set.insert(name, source)?;
    }
    Ok(Self { set, shell: BUILTIN_SHELL.to_string() })
  }

  /// Replace templates with same-named `*.html` files from `dir`.
  /// `document.html` replaces the shell.
  pub fn with_overrides(mut self, dir: &Path) -> Result<Self, SiteError> {
    let entries = std::fs::read_dir(dir)
      .map_err(|e| SiteError::template(format!("failed to read {}: {e}", dir.display())))?;
    let mut files: Vec<_> = entries
      .filter_map(Result::ok)
      .map(|e| e.path())
      .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
      .collect();
    files.sort();
    for path in files {
      let source = std::fs::read_to_string(&path)
        .map_err(|e| SiteError::template(format!("failed to read {}: {e}", path.display())))?;
      let Some(name) = path.file_stem().and_then(|s| s.to_str()) else { continue };
      if path.file_name().is_some_and(|f| f == SHELL_FILE) {
        self.shell = source;
      } else {
        self.set.insert(name, &source)?;
      }
      tracing::debug!(template = name, path = %path.display(), "template override loaded");
    }
    Ok(self)
  }

  /// Every page, the gate and the error boundary must exist, and every
  /// include must resolve.
  pub fn validate(&self) -> Result<(), SiteError> {
    let required = PageKind::ALL.iter().map(|k| k.template()).chain([GATE, ERROR_BOUNDARY]);
    for name in required {
      if !self.set.contains(name) {
        return Err(SiteError::template(format!("template '{name}' is missing")));
      }
    }
    if let Some((template, include)) = self.set.missing_includes().into_iter().next() {
      return Err(SiteError::template(format!("template '{template}' includes unknown '{include}'")));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtin_templates_are_complete() {
    let templates = Templates::builtin().unwrap();
    templates.validate().unwrap();
    assert!(templates.shell.contains(r#"<div id="__purr"></div>"#));
  }

  #[test]
  fn overrides_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("donate.html"), "<p>Give!</p>").unwrap();
    std::fs::write(dir.path().join(SHELL_FILE), "<html><head></head><body><div id=\"__purr\"></div></body></html>").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let templates = Templates::builtin().unwrap().with_overrides(dir.path()).unwrap();
    let rendered = templates.set.render("donate", &serde_json::json!({})).unwrap();
    assert_eq!(rendered.html, "<p>Give!</p>");
    assert!(templates.shell.starts_with("<html><head>"));
  }

  #[test]
  fn invalid_override_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("home.html"), "<!--purr:if:x-->never closed").unwrap();
    let err = Templates::builtin().unwrap().with_overrides(dir.path()).unwrap_err();
    assert_eq!(err.code(), "TEMPLATE_ERROR");
    assert!(err.message().contains("home"));
  }

  #[test]
  fn missing_include_fails_validation() {
    let mut templates = Templates::builtin().unwrap();
    templates.set.insert("footer", "<!--purr:include:sitemap-->").unwrap();
    let err = templates.validate().unwrap_err();
    assert!(err.message().contains("sitemap"));
  }
}
