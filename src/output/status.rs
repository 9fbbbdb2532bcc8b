use console::style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
    Vulnerable,
    NotVulnerable,
    Summary,
}

/// User-facing status lines.
///
/// Vulnerable hits and summaries always print; per-URL noise only in verbose mode.
#[derive(Debug, Clone, Copy)]
pub struct StatusPrinter {
    verbose: bool,
}

impl StatusPrinter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Render a line, or `None` when the current verbosity hides it.
    /// `always` forces Info / Success / Error lines through regardless of verbosity.
    pub fn format(&self, kind: StatusKind, message: &str, always: bool) -> Option<String> {
        let visible = always
            || self.verbose
            || matches!(kind, StatusKind::Vulnerable | StatusKind::Summary);
        if !visible {
            return None;
        }
        let line = match kind {
            StatusKind::Info => format!("{} {}", style("[INFO]").yellow(), message),
            StatusKind::Success => format!("{} {}", style("[SUCCESS]").green(), message),
            StatusKind::Error => format!("{} {}", style("[ERROR]").red(), message),
            StatusKind::Vulnerable => format!("{} {}", style("[VULNERABLE]").red().bold(), message),
            StatusKind::NotVulnerable => format!("{} {}", style("[NOT VULNERABLE]").green().bold(), message),
            StatusKind::Summary => style(message).cyan().bold().to_string(),
        };
        Some(line)
    }

    pub fn emit(&self, kind: StatusKind, message: &str, always: bool) {
        if let Some(line) = self.format(kind, message, always) {
            println!("{}", line);
        }
    }

    pub fn info(&self, message: &str) {
        self.emit(StatusKind::Info, message, true);
    }

    /// Info line shown only in verbose mode.
    pub fn detail(&self, message: &str) {
        self.emit(StatusKind::Info, message, false);
    }

    pub fn success(&self, message: &str) {
        self.emit(StatusKind::Success, message, true);
    }

    pub fn error(&self, message: &str) {
        self.emit(StatusKind::Error, message, true);
    }

    pub fn vulnerable(&self, url: &str) {
        self.emit(StatusKind::Vulnerable, url, true);
    }

    /// Final report for one domain, in discovery order.
    pub fn summary_lines(&self, vulnerable: &[String]) -> Vec<String> {
        let mut lines = Vec::new();
        if vulnerable.is_empty() {
            lines.extend(self.format(StatusKind::Summary, "\nNo vulnerable URLs found.", true));
        } else {
            lines.extend(self.format(StatusKind::Summary, "\nVulnerable URL(s) found:", true));
            for url in vulnerable {
                lines.extend(self.format(StatusKind::Vulnerable, url, true));
            }
        }
        lines
    }

    pub fn summary(&self, vulnerable: &[String]) {
        for line in self.summary_lines(vulnerable) {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: Option<String>) -> Option<String> {
        s.map(|l| console::strip_ansi_codes(&l).into_owned())
    }

    #[test]
    fn quiet_mode_hides_per_url_noise() {
        let p = StatusPrinter::new(false);
        assert_eq!(p.format(StatusKind::NotVulnerable, "http://a/?x=1", false), None);
        assert_eq!(p.format(StatusKind::Error, "http://a/?x=1 timeout", false), None);
        assert_eq!(p.format(StatusKind::Info, "starting", false), None);
        assert_eq!(
            plain(p.format(StatusKind::Vulnerable, "http://a/?x=1", false)).as_deref(),
            Some("[VULNERABLE] http://a/?x=1")
        );
    }

    #[test]
    fn verbose_mode_shows_everything() {
        let p = StatusPrinter::new(true);
        assert_eq!(
            plain(p.format(StatusKind::NotVulnerable, "http://a/?x=1", false)).as_deref(),
            Some("[NOT VULNERABLE] http://a/?x=1")
        );
    }

    #[test]
    fn summary_distinguishes_empty_set() {
        let p = StatusPrinter::new(false);
        let empty: Vec<String> = p.summary_lines(&[]).into_iter().map(|l| console::strip_ansi_codes(&l).into_owned()).collect();
        assert_eq!(empty, vec!["\nNo vulnerable URLs found."]);

        let found = p.summary_lines(&["http://b/?x=1".to_string(), "http://a/?x=1".to_string()]);
        assert_eq!(found.len(), 3);
        assert!(console::strip_ansi_codes(&found[1]).ends_with("http://b/?x=1"));
        assert!(console::strip_ansi_codes(&found[2]).ends_with("http://a/?x=1"));
    }
}
