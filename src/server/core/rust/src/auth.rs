/* src/server/core/rust/src/auth.rs */

//! Drives the access gate out of its checking state for one request.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use purr_engine::gate::{AuthGate, GateState, RemoteCheck, Role, Session};
use purr_gateway::{AuthUser, DataGateway};
use serde_json::Value;

pub fn unix_now() -> u64 {
  SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
}

/// Read the session claims carried by an access token without verifying
/// its signature; the remote check is what confirms it.
pub fn decode_session(token: &str) -> Option<Session> {
  let mut parts = token.split('.');
  let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
  if parts.next().is_some() {
    return None;
  }
  let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
  let claims: Value = serde_json::from_slice(&bytes).ok()?;
  let user_id = claims["sub"].as_str().filter(|s| !s.is_empty())?.to_string();
  Some(Session {
    user_id,
    email: claims["email"].as_str().map(String::from),
    role: Role::from_claim(claims["app_metadata"]["role"].as_str()),
    expires_at: claims["exp"].as_u64(),
  })
}

pub fn session_from_user(user: AuthUser) -> Session {
  Session {
    user_id: user.id,
    email: user.email,
    role: Role::from_claim(user.role.as_deref()),
    expires_at: user.expires_at,
  }
}

async fn remote_check(gateway: &dyn DataGateway, token: &str) -> RemoteCheck {
  match gateway.user(token).await {
    Ok(Some(user)) => RemoteCheck::Confirmed(session_from_user(user)),
    Ok(None) => RemoteCheck::Rejected,
    Err(err) if err.is_connectivity() => {
      tracing::warn!(error = %err, "session check could not reach the auth service");
      RemoteCheck::ConnectionFailed
    }
    Err(err) => {
      tracing::warn!(error = %err, "session check failed");
      RemoteCheck::Rejected
    }
  }
}

/// Resolve a gate for `required` from an optional access token. The local
/// claims read and the remote confirmation both settle before the decision.
pub async fn check_access(gateway: &dyn DataGateway, token: Option<&str>, required: Role, now: u64) -> GateState {
  let mut gate = AuthGate::new(required);
  let Some(token) = token.filter(|t| !t.is_empty()) else {
    return gate.resolve(None, RemoteCheck::Rejected, now).clone();
  };
  let (local, remote) = tokio::join!(async { decode_session(token) }, remote_check(gateway, token));
  gate.resolve(local.as_ref(), remote, now).clone()
}
