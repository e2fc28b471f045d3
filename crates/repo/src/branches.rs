/// Branch names from `git branch` style output: one per line, the current
/// one marked with `*` (or `+` when checked out in another worktree).
/// Detached entries such as `(HEAD detached at 1a2b3c)` are skipped.
pub fn parse_branch_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.trim().trim_start_matches(['*', '+']).trim())
        .filter(|name| !name.is_empty() && !name.starts_with('('))
        .map(str::to_string)
        .collect()
}

/// `main` when present, else `master`.
pub fn pick_default_base(branches: &[String]) -> Option<&str> {
    ["main", "master"]
        .into_iter()
        .find(|candidate| branches.iter().any(|b| b == *candidate))
}
