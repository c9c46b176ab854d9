/* src/server/engine/rust/src/gate.rs */

//! Access gate for protected pages.
//!
//! A gate starts in [`GateState::Checking`] and resolves exactly once, after
//! both the local session read and the remote confirmation have settled.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Admin,
}

impl Role {
  /// Unknown role claims are treated as the least privileged role.
  pub fn from_claim(claim: Option<&str>) -> Self {
    match claim {
      Some("admin") => Self::Admin,
      _ => Self::User,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::User => "user",
      Self::Admin => "admin",
    }
  }

  pub fn satisfies(self, required: Role) -> bool {
    self >= required
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub user_id: String,
  pub email: Option<String>,
  pub role: Role,
  /// Unix seconds; `None` means the token carries no expiry.
  pub expires_at: Option<u64>,
}

impl Session {
  pub fn is_expired(&self, now: u64) -> bool {
    self.expires_at.is_some_and(|exp| exp <= now)
  }
}

/// What the remote platform said about the presented token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCheck {
  Confirmed(Session),
  Rejected,
  ConnectionFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
  Checking,
  Unauthenticated { connection_error: bool },
  Insufficient,
  Authorized { session: Session },
}

impl GateState {
  pub fn is_resolved(&self) -> bool {
    !matches!(self, Self::Checking)
  }
}

#[derive(Debug, Clone)]
pub struct AuthGate {
  required: Role,
  state: GateState,
}

impl AuthGate {
  pub fn new(required: Role) -> Self {
    Self { required, state: GateState::Checking }
  }

  pub fn required(&self) -> Role {
    self.required
  }

  pub fn state(&self) -> &GateState {
    &self.state
  }

  /// Children render only once the gate has authorized the session.
  pub fn renders_children(&self) -> bool {
    matches!(self.state, GateState::Authorized { .. })
  }

  /// Settle the gate. Calls after the first resolution are ignored.
  pub fn resolve(&mut self, local: Option<&Session>, remote: RemoteCheck, now: u64) -> &GateState {
    if self.state.is_resolved() {
      return &self.state;
    }
    self.state = decide(self.required, local, remote, now);
    &self.state
  }
}

fn decide(required: Role, local: Option<&Session>, remote: RemoteCheck, now: u64) -> GateState {
  let Some(local) = local.filter(|s| !s.is_expired(now)) else {
    return GateState::Unauthenticated { connection_error: false };
  };
  let remote = match remote {
    RemoteCheck::Confirmed(session) => session,
    RemoteCheck::Rejected => return GateState::Unauthenticated { connection_error: false },
    RemoteCheck::ConnectionFailed => return GateState::Unauthenticated { connection_error: true },
  };
  if remote.user_id != local.user_id {
    return GateState::Unauthenticated { connection_error: false };
  }
  if !remote.role.satisfies(required) {
    return GateState::Insufficient;
  }
  let expires_at = remote.expires_at.or(local.expires_at);
  GateState::Authorized { session: Session { expires_at, ..remote } }
}
