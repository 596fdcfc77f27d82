//! Reconstruction of project paths from their encoded directory names.
//!
//! Claude stores each project's transcripts under a directory named after the
//! project's absolute path, with every `/` flattened to `-`. The flattening is
//! lossy: a dash in the encoded name may have been a path separator, a literal
//! dash inside a directory name (`my-app`), or a dot (`github.com`,
//! `first.last`). `-home-dev-my-app` could mean `/home/dev/my-app` or
//! `/home/dev/my/app`, and the name alone cannot say which.
//!
//! Decoding resolves the ambiguity by probing the live filesystem: at each
//! position it accepts the first token grouping that names an entry that
//! actually exists. The walk is greedy and never backtracks: a wrong early
//! acceptance is not undone, and a segment containing more than one encoded
//! dot (`sub.example.co.uk`) cannot be recovered. Real transcript names
//! satisfy the greedy pass in practice, so that trade stays.
//!
//! The result is display-quality: when nothing on disk confirms a grouping
//! the decoder keeps the raw tokens as-is rather than failing, so callers
//! must not treat the output as a verified path.

use std::path::Path;

/// Answers "does this absolute path exist right now".
///
/// The decoder only ever asks this one question, so tests inject a fixed set
/// of paths instead of a real filesystem. Implementations must return `false`
/// for anything that cannot be stat'd (missing, permission denied, or
/// otherwise) and must never fail.
pub trait PathOracle {
    fn exists(&self, path: &str) -> bool;
}

/// Probes the real filesystem.
pub struct FsOracle;

impl PathOracle for FsOracle {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }
}

/// A decoded project path: the absolute form plus its ordered segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    pub full_path: String,
    pub components: Vec<String>,
}

/// Rebuild the original absolute path from an encoded directory name.
///
/// Total: always returns a structurally valid result. With an oracle that
/// confirms nothing, the output degrades to one component per dash-delimited
/// token, the naive split the encoding started from.
///
/// `home_dir` feeds the one root special case: macOS home directories for
/// usernames containing a dot (`/Users/first.last`), which would otherwise
/// split into two bogus components before any probing can happen.
pub fn reconstruct(encoded_name: &str, home_dir: &str, oracle: &impl PathOracle) -> Reconstruction {
    let remainder = encoded_name.strip_prefix('-').unwrap_or(encoded_name);
    if remainder.is_empty() {
        return Reconstruction {
            full_path: "/".to_string(),
            components: vec!["/".to_string()],
        };
    }

    // Naive split. Over-segmented: one real segment may span several tokens.
    let tokens: Vec<&str> = remainder.split('-').collect();

    let mut components: Vec<String> = Vec::new();
    let mut i = 0;

    // Dotted-username roots: `Users-first-last-...` where the user's home is
    // `/Users/first.last`. The username is accepted from the home directory
    // string alone, before any filesystem probe.
    if tokens[0] == "Users" && tokens.len() >= 3 {
        let username = format!("{}.{}", tokens[1], tokens[2]);
        if home_dir == format!("/Users/{}", username) {
            components.push(tokens[0].to_string());
            components.push(username);
            i = 3;
        }
    }
    if components.is_empty() {
        components.push(tokens[0].to_string());
        i = 1;
    }

    let mut current_path = format!("/{}", components.join("/"));

    while i < tokens.len() {
        // Dot-join first: `github-com` is far more likely `github.com` than a
        // `github/com` pair of nested directories. Tried only at the cursor,
        // never retroactively.
        if i + 1 < tokens.len() {
            let candidate = format!("{}.{}", tokens[i], tokens[i + 1]);
            let probe = format!("{}/{}", current_path, candidate);
            if oracle.exists(&probe) {
                current_path = probe;
                components.push(candidate);
                i += 2;
                continue;
            }
        }

        // Dash-join, shortest match wins: grow the candidate one token at a
        // time and take the first grouping that exists on disk.
        let mut matched = false;
        for end in i + 1..=tokens.len() {
            let candidate = tokens[i..end].join("-");
            let probe = format!("{}/{}", current_path, candidate);
            if oracle.exists(&probe) {
                current_path = probe;
                components.push(candidate);
                i = end;
                matched = true;
                break;
            }
        }
        if matched {
            continue;
        }

        // Nothing on disk confirms any grouping; the directory may have been
        // deleted or renamed since the encoding was made. Keep the raw token
        // so the result still covers the whole encoded name.
        current_path = format!("{}/{}", current_path, tokens[i]);
        components.push(tokens[i].to_string());
        i += 1;
    }

    Reconstruction {
        full_path: current_path,
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct MapOracle {
        paths: HashSet<String>,
    }

    impl MapOracle {
        fn new(paths: &[&str]) -> Self {
            Self {
                paths: paths.iter().map(|p| p.to_string()).collect(),
            }
        }

        fn empty() -> Self {
            Self {
                paths: HashSet::new(),
            }
        }
    }

    impl PathOracle for MapOracle {
        fn exists(&self, path: &str) -> bool {
            self.paths.contains(path)
        }
    }

    #[test]
    fn trivial_layout_resolves_exactly() {
        let oracle = MapOracle::new(&["/home/dev", "/home/dev/myproj"]);
        let rec = reconstruct("-home-dev-myproj", "/home/dev", &oracle);
        assert_eq!(rec.components, vec!["home", "dev", "myproj"]);
        assert_eq!(rec.full_path, "/home/dev/myproj");
    }

    #[test]
    fn dashed_directory_name_is_rejoined() {
        let oracle = MapOracle::new(&["/home/dev", "/home/dev/my-cool-app"]);
        let rec = reconstruct("-home-dev-my-cool-app", "/home/dev", &oracle);
        assert_eq!(rec.components, vec!["home", "dev", "my-cool-app"]);
    }

    #[test]
    fn dotted_username_special_case() {
        let oracle = MapOracle::new(&["/Users/first.last/myproj"]);
        let rec = reconstruct("-Users-first-last-myproj", "/Users/first.last", &oracle);
        assert_eq!(rec.components, vec!["Users", "first.last", "myproj"]);
        assert_eq!(rec.full_path, "/Users/first.last/myproj");
    }

    #[test]
    fn dotted_username_requires_matching_home() {
        // Same encoded name, but the process's home is someone else's.
        let oracle = MapOracle::empty();
        let rec = reconstruct("-Users-first-last-myproj", "/Users/other", &oracle);
        assert_eq!(rec.components, vec!["Users", "first", "last", "myproj"]);
    }

    #[test]
    fn dot_join_preferred_over_dash_join() {
        let oracle = MapOracle::new(&[
            "/home/dev",
            "/home/dev/github.com",
            "/home/dev/github.com/org",
            "/home/dev/github.com/org/repo",
        ]);
        let rec = reconstruct("-home-dev-github-com-org-repo", "/home/dev", &oracle);
        assert_eq!(
            rec.components,
            vec!["home", "dev", "github.com", "org", "repo"]
        );
        assert_eq!(rec.full_path, "/home/dev/github.com/org/repo");
    }

    #[test]
    fn shortest_dash_match_wins() {
        // Both `a` and `a-b` exist under the root; the shorter grouping is
        // taken and the rest fall through unverified.
        let oracle = MapOracle::new(&["/data/a", "/data/a-b"]);
        let rec = reconstruct("-data-a-b-c", "/home/dev", &oracle);
        assert_eq!(rec.components, vec!["data", "a", "b", "c"]);
    }

    #[test]
    fn dead_filesystem_degrades_to_naive_split() {
        let oracle = MapOracle::empty();
        let rec = reconstruct("-var-log-some-old-dir", "/home/dev", &oracle);
        assert_eq!(rec.components, vec!["var", "log", "some", "old", "dir"]);
        assert_eq!(rec.full_path, "/var/log/some/old/dir");
    }

    #[test]
    fn root_marker_alone_yields_root() {
        let oracle = MapOracle::empty();
        let rec = reconstruct("-", "/home/dev", &oracle);
        assert_eq!(rec.full_path, "/");
        assert_eq!(rec.components, vec!["/"]);
    }

    #[test]
    fn hidden_directory_from_double_dash() {
        // `--` produces an empty token; dot-joining it with its successor
        // recovers `.name` hidden directories.
        let oracle = MapOracle::new(&[
            "/home/dev",
            "/home/dev/proj",
            "/home/dev/proj/.worktrees",
            "/home/dev/proj/.worktrees/fix",
        ]);
        let rec = reconstruct("-home-dev-proj--worktrees-fix", "/home/dev", &oracle);
        assert_eq!(
            rec.components,
            vec!["home", "dev", "proj", ".worktrees", "fix"]
        );
    }

    #[test]
    fn reconstruction_is_idempotent() {
        let oracle = MapOracle::new(&["/home/dev", "/home/dev/acme.io"]);
        let first = reconstruct("-home-dev-acme-io", "/home/dev", &oracle);
        let second = reconstruct("-home-dev-acme-io", "/home/dev", &oracle);
        assert_eq!(first, second);
        assert_eq!(first.components, vec!["home", "dev", "acme.io"]);
    }

    #[test]
    fn no_backtracking_after_wrong_acceptance() {
        // `/opt/a` exists so `a` is accepted alone, even though only
        // `/opt/a-b/c` would let the rest resolve. Documented limitation.
        let oracle = MapOracle::new(&["/opt/a", "/opt/a-b", "/opt/a-b/c"]);
        let rec = reconstruct("-opt-a-b-c", "/home/dev", &oracle);
        assert_eq!(rec.components, vec!["opt", "a", "b", "c"]);
    }
}
