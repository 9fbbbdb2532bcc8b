use std::fs;
use std::path::Path;

use crate::errors::HunterError;

pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Read a newline-delimited domain list. Lines are trimmed and lowercased; blanks are skipped.
pub fn read_domain_list(path: &Path) -> Result<Vec<String>, HunterError> {
    let data = fs::read_to_string(path).map_err(|source| HunterError::TargetList {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_domain_list(&data))
}

pub fn parse_domain_list(data: &str) -> Vec<String> {
    data.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_list_is_trimmed_and_lowercased() {
        let list = parse_domain_list("  Example.COM \n\n\tfoo.org\n   \n");
        assert_eq!(list, vec!["example.com", "foo.org"]);
    }

    #[test]
    fn unreadable_list_is_target_error() {
        let err = read_domain_list(Path::new("/nonexistent/domains.txt")).unwrap_err();
        assert!(matches!(err, HunterError::TargetList { .. }));
    }
}
