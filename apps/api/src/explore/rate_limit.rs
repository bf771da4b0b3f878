use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::search_client::RateLimitNotice;

/// Upper bound on a single cooldown, guarding against absurd reset values.
const MAX_COOLDOWN_SECS: u64 = 24 * 60 * 60;

/// An active backend throttle. Held by `Phase::Blocked` until `reset_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cooldown {
    pub reset_at: DateTime<Utc>,
    pub message: String,
    pub is_authenticated: bool,
}

impl Cooldown {
    pub fn from_notice(notice: &RateLimitNotice, now: DateTime<Utc>) -> Self {
        let secs = notice.reset_in_seconds.min(MAX_COOLDOWN_SECS) as i64;
        Self {
            reset_at: now + Duration::seconds(secs),
            message: notice.message.clone(),
            is_authenticated: notice.is_authenticated,
        }
    }

    /// Notice describing what is left of this cooldown at `now`.
    pub fn notice(&self, now: DateTime<Utc>) -> RateLimitNotice {
        RateLimitNotice {
            message: self.message.clone(),
            reset_in_seconds: self.remaining_secs(now),
            is_authenticated: self.is_authenticated,
        }
    }

    pub fn has_elapsed(&self, now: DateTime<Utc>) -> bool {
        now >= self.reset_at
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0);
        // round up so a live countdown never shows 0 while still blocked
        ((millis + 999) / 1000) as u64
    }
}

/// Rate-limit view exposed to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RateLimitState {
    pub is_blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_at_epoch_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_in_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RateLimitState {
    pub fn from_cooldown(cooldown: Option<&Cooldown>, now: DateTime<Utc>) -> Self {
        match cooldown {
            Some(c) if !c.has_elapsed(now) => Self {
                is_blocked: true,
                reset_at_epoch_ms: Some(c.reset_at.timestamp_millis()),
                reset_in_seconds: Some(c.remaining_secs(now)),
                message: Some(c.message.clone()),
            },
            _ => Self::default(),
        }
    }
}
