/* src/cli/core/src/ui.rs */

// Operator-facing output. Diagnostics go through `tracing`; this is the
// human progress narrative.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use indicatif::{ProgressBar, ProgressStyle};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

pub fn banner(command: &str, subtitle: Option<&str>) {
  match subtitle {
    Some(sub) => println!("\n  {BOLD}{CYAN}purr {command}{RESET}  {DIM}{sub}{RESET}\n"),
    None => println!("\n  {BOLD}{CYAN}purr {command}{RESET}\n"),
  }
}

pub fn step(n: usize, total: usize, msg: &str) {
  println!("  {DIM}[{n}/{total}]{RESET} {msg}");
}

pub fn detail(msg: &str) {
  println!("        {msg}");
}

pub fn detail_ok(msg: &str) {
  println!("        {GREEN}✓{RESET} {msg}");
}

pub fn ok(msg: &str) {
  println!("  {GREEN}✓{RESET} {msg}");
}

pub fn warn(msg: &str) {
  println!("  {YELLOW}!{RESET} {msg}");
}

pub fn error(msg: &str) {
  eprintln!("  {RED}✗{RESET} {msg}");
}

/// Unadorned line, for output meant to be piped.
pub fn line(msg: &str) {
  println!("{msg}");
}

pub fn progress(len: u64) -> ProgressBar {
  let bar = ProgressBar::new(len);
  if let Ok(style) = ProgressStyle::with_template("        {bar:30.cyan/dim} {pos}/{len} {msg}") {
    bar.set_style(style.progress_chars("━╸ "));
  }
  bar
}
