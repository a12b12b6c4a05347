//! Role hierarchy: every role implies the scopes of all roles ranked below it.

use std::collections::BTreeSet;

use crate::models::RoleName;

/// Ranking from most to least privileged. The closure of a role is the
/// suffix of this table starting at that role.
const HIERARCHY: [RoleName; 5] = [
    RoleName::SuperAdmin,
    RoleName::Admin,
    RoleName::Manager,
    RoleName::User,
    RoleName::ReportingUser,
];

/// Scopes granted by `role_name`. Unknown names grant nothing.
pub fn expand(role_name: &str) -> BTreeSet<RoleName> {
    match role_name.parse::<RoleName>() {
        Ok(role) => expand_role(role),
        Err(_) => BTreeSet::new(),
    }
}

pub fn expand_role(role: RoleName) -> BTreeSet<RoleName> {
    HIERARCHY
        .iter()
        .position(|r| *r == role)
        .map(|idx| HIERARCHY[idx..].iter().copied().collect())
        .unwrap_or_default()
}

/// Wire form of a scope set, e.g. `["ADMIN", "MANAGER"]`.
pub fn to_scope_strings(scopes: &BTreeSet<RoleName>) -> Vec<String> {
    scopes.iter().map(|s| s.scope().to_string()).collect()
}

/// Parses scope strings, silently dropping names outside the hierarchy.
pub fn parse_scopes<S: AsRef<str>>(raw: &[S]) -> BTreeSet<RoleName> {
    raw.iter()
        .filter_map(|s| s.as_ref().parse::<RoleName>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_sizes_follow_rank() {
        assert_eq!(expand("super_admin").len(), 5);
        assert_eq!(expand("admin").len(), 4);
        assert_eq!(expand("manager").len(), 3);
        assert_eq!(expand("user").len(), 2);
        assert_eq!(expand("reporting_user").len(), 1);
    }

    #[test]
    fn lowest_role_expands_to_itself() {
        let scopes = expand("reporting_user");
        assert_eq!(scopes, BTreeSet::from([RoleName::ReportingUser]));
    }

    #[test]
    fn expansion_is_downward_closed() {
        let scopes = expand("MANAGER");
        assert!(scopes.contains(&RoleName::Manager));
        assert!(scopes.contains(&RoleName::User));
        assert!(scopes.contains(&RoleName::ReportingUser));
        assert!(!scopes.contains(&RoleName::Admin));
        assert!(!scopes.contains(&RoleName::SuperAdmin));
    }

    #[test]
    fn unknown_role_grants_nothing() {
        assert!(expand("owner").is_empty());
        assert!(expand("").is_empty());
    }

    #[test]
    fn scope_strings_round_trip() {
        let strings = to_scope_strings(&expand("user"));
        assert_eq!(strings, vec!["USER".to_string(), "REPORTING_USER".to_string()]);
        assert_eq!(parse_scopes(&strings), expand("user"));
    }

    #[test]
    fn parse_scopes_drops_unknown_names() {
        let parsed = parse_scopes(&["ADMIN", "billing:write"]);
        assert_eq!(parsed, BTreeSet::from([RoleName::Admin]));
    }
}
