//! Log-safe text form of a command tree.

use std::fmt::Write;

use crate::step::{Action, Guard, SyncStep};

/// Render the tree one node per line, children indented by two spaces.
/// Every value registered by a `Secret` step is replaced by its display form.
pub fn render(step: &SyncStep) -> String {
    let mut secrets: Vec<(String, String)> = step
        .walk()
        .into_iter()
        .filter_map(|node| match &node.action {
            Action::Secret { value, display } if !value.is_empty() => {
                Some((value.clone(), display.clone()))
            }
            _ => None,
        })
        .collect();
    // Longest first so a secret containing another is masked whole
    secrets.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::new();
    write_step(step, 0, &mut out);
    for (value, display) in &secrets {
        out = out.replace(value.as_str(), display);
    }
    out
}

fn write_step(step: &SyncStep, depth: usize, out: &mut String) {
    let _ = write!(out, "{:indent$}{}", "", describe(step), indent = depth * 2);
    if let Some(dir) = &step.working_dir {
        let _ = write!(out, " (in {})", dir.display());
    }
    if let Some(guard) = &step.guard {
        let _ = write!(out, " if {}", describe_guard(guard));
    }
    out.push('\n');

    for child in step.children() {
        write_step(child, depth + 1, out);
    }
}

fn describe(step: &SyncStep) -> String {
    match &step.action {
        Action::Exec { .. } => step.command_line().unwrap_or_default(),
        Action::Compose { .. } => "compose".to_string(),
        Action::Echo { message } => format!("echo {message:?}"),
        Action::Secret { display, .. } => format!("secret {display}"),
        Action::CleanDir { path } => format!("cleandir {}", path.display()),
        Action::MkDirs { path } => format!("mkdirs {}", path.display()),
        Action::Fail { message } => format!("fail {message:?}"),
    }
}

fn describe_guard(guard: &Guard) -> String {
    match guard {
        Guard::DirExists { path } => format!("dir-exists {}", path.display()),
        Guard::DirMissing { path } => format!("dir-missing {}", path.display()),
        Guard::FileExists { path } => format!("file-exists {}", path.display()),
        Guard::FileMissing { path } => format!("file-missing {}", path.display()),
        Guard::Equals { expected, probe } => {
            format!("{expected:?} == $({})", describe(probe))
        }
        Guard::NotEquals { expected, probe } => {
            format!("{expected:?} != $({})", describe(probe))
        }
        Guard::All { guards } => guards
            .iter()
            .map(describe_guard)
            .collect::<Vec<_>>()
            .join(" && "),
    }
}
