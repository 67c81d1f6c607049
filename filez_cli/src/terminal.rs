//! Deciding whether output goes to a person

use std::env;
use std::io::{IsTerminal, stdout};

/// Variables set by common CI runners, which may allocate a TTY nobody reads
const CI_VARIABLES: &[&str] = &[
    "CI",
    "CONTINUOUS_INTEGRATION",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "JENKINS_URL",
    "BUILDKITE",
    "TF_BUILD",
];

/// Stdout is a terminal outside CI
pub fn is_interactive() -> bool {
    stdout().is_terminal() && !is_ci_environment()
}

/// Whether colored output should be used.
///
/// `color_enabled` comes from `output.color_enabled`; `NO_COLOR` and
/// `TERM=dumb` switch colors off regardless.
pub fn use_color(color_enabled: bool) -> bool {
    color_enabled && !color_disabled_by_environment() && is_interactive()
}

fn color_disabled_by_environment() -> bool {
    env::var_os("NO_COLOR").is_some() || env::var("TERM").is_ok_and(|term| term == "dumb")
}

fn is_ci_environment() -> bool {
    CI_VARIABLES.iter().any(|name| env::var_os(name).is_some())
}
