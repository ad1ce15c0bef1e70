//! Login gate (C9).
//!
//! Mirrors the reference shell's username/password prompt sequencing, with
//! the actual credential check left to an injected callback (the spec's
//! `hash_compare`) rather than a hardcoded comparison.

use crate::config::MAX_USER_LEN;
use heapless::String;

pub type HashCompareFn = fn(username: &str, password: &str) -> bool;

enum LoginState {
    /// Login is not required at all; every line is accepted.
    Disabled,
    AwaitingUsername,
    AwaitingPassword { username: String<MAX_USER_LEN> },
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    /// Show the username prompt and wait for the next line.
    NeedUsername,
    /// Show the password prompt (caller should disable local echo) and wait.
    NeedPassword,
    /// Credentials accepted; ordinary command processing may begin.
    Authenticated,
    /// Credentials rejected; caller should re-prompt for a username.
    Rejected,
}

pub struct Session {
    state: LoginState,
    hash_compare: Option<HashCompareFn>,
}

impl Session {
    /// `hash_compare: None` disables the login gate entirely (spec's
    /// `--no-login` / unauthenticated-by-default mode).
    pub fn new(hash_compare: Option<HashCompareFn>) -> Self {
        let state = if hash_compare.is_some() {
            LoginState::AwaitingUsername
        } else {
            LoginState::Disabled
        };
        Self { state, hash_compare }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, LoginState::Disabled | LoginState::Authenticated)
    }

    /// Feeds one completed line (username or password, depending on state)
    /// into the login state machine.
    pub fn submit_line(&mut self, line: &str) -> SessionStep {
        match &self.state {
            LoginState::Disabled | LoginState::Authenticated => SessionStep::Authenticated,
            LoginState::AwaitingUsername => {
                let mut username = String::new();
                let _ = username.push_str(line);
                self.state = LoginState::AwaitingPassword { username };
                SessionStep::NeedPassword
            }
            LoginState::AwaitingPassword { username } => {
                let accepted = self
                    .hash_compare
                    .map(|cmp| cmp(username.as_str(), line))
                    .unwrap_or(false);
                if accepted {
                    self.state = LoginState::Authenticated;
                    SessionStep::Authenticated
                } else {
                    self.state = LoginState::AwaitingUsername;
                    SessionStep::Rejected
                }
            }
        }
    }

    /// The prompt the caller should currently be showing, before any line
    /// has been submitted.
    pub fn current_step(&self) -> SessionStep {
        match self.state {
            LoginState::Disabled | LoginState::Authenticated => SessionStep::Authenticated,
            LoginState::AwaitingUsername => SessionStep::NeedUsername,
            LoginState::AwaitingPassword { .. } => SessionStep::NeedPassword,
        }
    }

    /// Password-entry lines should not be echoed back to the terminal.
    pub fn needs_masked_input(&self) -> bool {
        matches!(self.state, LoginState::AwaitingPassword { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept_alice_secret(user: &str, pass: &str) -> bool {
        user == "alice" && pass == "secret"
    }

    #[test]
    fn disabled_session_is_already_authenticated() {
        let session = Session::new(None);
        assert!(session.is_authenticated());
        assert_eq!(session.current_step(), SessionStep::Authenticated);
    }

    #[test]
    fn correct_credentials_authenticate() {
        let mut session = Session::new(Some(accept_alice_secret));
        assert_eq!(session.current_step(), SessionStep::NeedUsername);
        assert_eq!(session.submit_line("alice"), SessionStep::NeedPassword);
        assert!(session.needs_masked_input());
        assert_eq!(session.submit_line("secret"), SessionStep::Authenticated);
        assert!(session.is_authenticated());
    }

    #[test]
    fn wrong_password_returns_to_username_prompt() {
        let mut session = Session::new(Some(accept_alice_secret));
        session.submit_line("alice");
        assert_eq!(session.submit_line("wrong"), SessionStep::Rejected);
        assert!(!session.is_authenticated());
        assert_eq!(session.current_step(), SessionStep::NeedUsername);
    }
}
