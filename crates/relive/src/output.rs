//! Colored terminal output utilities.

use std::path::Path;

use console::{Style, Term};
use relive_watch::{ChangeEvent, ChangeKind};

const RELOAD_ICON: &str = "↻";
const LISTENING_ICON: &str = "⚡";
const ERROR_ICON: &str = "⚠";

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    err_term: Term,
    green: Style,
    blue: Style,
    red: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stdout(),
            err_term: Term::stderr(),
            green: Style::new().green(),
            blue: Style::new().blue(),
            red: Style::new().red(),
        }
    }

    /// Print the listening line with the server URL.
    pub(crate) fn listening(&self, url: &str) {
        let _ = self.term.write_line(&format!(
            "{} server listening on {}",
            self.blue.apply_to(LISTENING_ICON),
            self.blue.apply_to(url)
        ));
    }

    /// Print one line for a change under `root`.
    pub(crate) fn change(&self, event: &ChangeEvent, root: &Path) {
        let _ = self.term.write_line(&format!(
            "{} {} {}",
            self.green.apply_to(RELOAD_ICON),
            friendly_name(event.kind),
            display_path(&event.path, root)
        ));
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.err_term.write_line(&format!(
            "{} {}",
            self.red.apply_to(ERROR_ICON),
            self.red.apply_to(msg)
        ));
    }
}

/// Word shown for a change kind.
fn friendly_name(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Changed => "Changed",
        ChangeKind::Added | ChangeKind::DirAdded => "Added",
        ChangeKind::Removed | ChangeKind::DirRemoved => "Deleted",
    }
}

/// Path relative to the served root, or as reported when outside it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_friendly_name() {
        assert_eq!(friendly_name(ChangeKind::Changed), "Changed");
        assert_eq!(friendly_name(ChangeKind::Added), "Added");
        assert_eq!(friendly_name(ChangeKind::DirAdded), "Added");
        assert_eq!(friendly_name(ChangeKind::Removed), "Deleted");
        assert_eq!(friendly_name(ChangeKind::DirRemoved), "Deleted");
    }

    #[test]
    fn test_display_path_relative_to_root() {
        assert_eq!(
            display_path(Path::new("/site/css/app.css"), Path::new("/site")),
            Path::new("css").join("app.css").display().to_string()
        );
    }

    #[test]
    fn test_display_path_outside_root() {
        assert_eq!(
            display_path(Path::new("/elsewhere/a.txt"), Path::new("/site")),
            "/elsewhere/a.txt"
        );
    }
}
