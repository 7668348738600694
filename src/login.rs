//! Dashboard login gate against a fixed pair of accounts.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Analyst,
}

impl Role {
    pub fn can_edit_settings(self) -> bool {
        self == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub role: Role,
}

const ACCOUNTS: &[(&str, &str, Role)] = &[
    ("admin", "admin123", Role::Admin),
    ("analyst", "analyst123", Role::Analyst),
];

/// Exact, case-sensitive match against the fixed accounts.
pub fn authenticate(username: &str, password: &str) -> Option<Session> {
    let found = ACCOUNTS
        .iter()
        .find(|(user, pass, _)| *user == username && *pass == password)
        .map(|&(user, _, role)| Session {
            username: user.to_string(),
            role,
        });
    match &found {
        Some(s) => tracing::info!(user = %s.username, role = ?s.role, "login succeeded"),
        None => tracing::warn!(user = %username, "login failed"),
    }
    found
}
