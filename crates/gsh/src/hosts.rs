//! Host list and username resolution

use std::path::{Path, PathBuf};

use eyre::{WrapErr, eyre};

/// Directory under `$HOME` holding group files and the config
pub const GSH_DIR: &str = ".gsh";

/// Split a comma separated `--hosts` value, dropping empty entries
#[must_use]
pub fn parse_host_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect()
}

/// One host per line; blank lines and `#` comments are skipped
#[must_use]
pub fn parse_group(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Path of the group file `name`
///
/// # Errors
/// Returns error if the home directory cannot be determined
pub fn group_path(name: &str) -> eyre::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| eyre!("cannot determine home directory"))?;
    Ok(home.join(GSH_DIR).join(name))
}

/// Read a group file
///
/// # Errors
/// Returns error if the file cannot be read
pub fn load_group(path: &Path) -> eyre::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read host group {}", path.display()))?;
    Ok(parse_group(&content))
}

/// Resolve the host list; a group takes precedence over `--hosts`
///
/// # Errors
/// Returns error if the group file cannot be read
pub fn resolve(hosts: Option<&str>, group: Option<&str>) -> eyre::Result<Vec<String>> {
    if let Some(name) = group {
        let path = group_path(name)?;
        return load_group(&path);
    }
    Ok(hosts.map(parse_host_list).unwrap_or_default())
}

/// Pick the default remote user: flag, then config, then the login name
///
/// # Errors
/// Returns error if no source yields a name
pub fn resolve_user(flag: Option<&str>, config: Option<&str>) -> eyre::Result<String> {
    if let Some(user) = flag.or(config).filter(|u| !u.is_empty()) {
        return Ok(user.to_string());
    }

    ["USER", "LOGNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|u| !u.is_empty()))
        .ok_or_else(|| eyre!("cannot determine local username; pass --user"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_list() {
        assert_eq!(
            parse_host_list("web1,alice@web2,,db1"),
            vec!["web1", "alice@web2", "db1"]
        );
        assert!(parse_host_list("").is_empty());
    }

    #[test]
    fn test_parse_group() {
        let content = "# web tier\nweb1\n  web2  \n\nroot@db1\n";
        assert_eq!(parse_group(content), vec!["web1", "web2", "root@db1"]);
    }

    #[test]
    fn test_group_wins_over_hosts() {
        let path = std::env::temp_dir().join(format!("gsh_group_{}", std::process::id()));
        std::fs::write(&path, "g1\ng2\n").unwrap();

        assert_eq!(load_group(&path).unwrap(), vec!["g1", "g2"]);

        // An absolute name joins to itself, which lets us point at the temp file
        let name = path.to_str().unwrap();
        assert_eq!(resolve(Some("h1"), Some(name)).unwrap(), vec!["g1", "g2"]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_group_is_an_error() {
        let path = std::env::temp_dir().join("gsh_no_such_group");
        assert!(load_group(&path).is_err());
    }

    #[test]
    fn test_resolve_without_group() {
        assert_eq!(resolve(Some("a,b"), None).unwrap(), vec!["a", "b"]);
        assert!(resolve(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_user_precedence() {
        assert_eq!(resolve_user(Some("flag"), Some("cfg")).unwrap(), "flag");
        assert_eq!(resolve_user(None, Some("cfg")).unwrap(), "cfg");
    }
}
