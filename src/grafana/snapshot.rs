//! Snapshot helpers: display window handling, expiry floor, view URLs.

use super::GrafanaError;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// The display window a snapshot renders. Both bounds are instants; the
/// dashboard's embedded time range is rewritten to these before the
/// snapshot is created, since the remote service renders exactly what the
/// range fields specify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    /// Window ending now and spanning `length` back.
    pub fn ending_now(length: Duration) -> Self {
        let to = Utc::now();
        Self {
            from: to - chrono::Duration::from_std(length).unwrap_or(chrono::Duration::hours(24)),
            to,
        }
    }

    /// The start must be strictly before the end.
    pub fn validate(&self) -> Result<(), GrafanaError> {
        if self.from >= self.to {
            return Err(GrafanaError::InvalidWindow {
                from: self.from,
                to: self.to,
            });
        }
        Ok(())
    }
}

/// Opaque handle for a created snapshot; `key` builds view URLs and drives
/// deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHandle {
    pub key: String,
}

/// Expiration in seconds as sent to the remote service. Requests that
/// would expire sooner than `floor` are extended to it, so a snapshot
/// never disappears before it can be viewed.
pub fn effective_expiry_secs(expiry: DateTime<Utc>, now: DateTime<Utc>, floor: Duration) -> i64 {
    let requested = (expiry - now).num_seconds();
    let floor_secs = floor.as_secs() as i64;
    requested.max(floor_secs)
}

/// Rewrite the dashboard's embedded time range to `window`, as Unix
/// timestamps. Returns a new value; the input is untouched.
pub fn with_time_range(
    dashboard: &serde_json::Value,
    window: TimeWindow,
) -> Result<serde_json::Value, GrafanaError> {
    let mut rewritten = dashboard.clone();

    let root = rewritten.as_object_mut().ok_or_else(|| {
        GrafanaError::InvalidPayload("dashboard description is not an object".to_string())
    })?;

    let time = root
        .entry("time")
        .or_insert_with(|| serde_json::json!({}));
    let time = time.as_object_mut().ok_or_else(|| {
        GrafanaError::InvalidPayload("dashboard time range is not an object".to_string())
    })?;

    time.insert("from".to_string(), serde_json::json!(window.from.timestamp()));
    time.insert("to".to_string(), serde_json::json!(window.to.timestamp()));

    Ok(rewritten)
}

/// Per-panel view URL for a snapshot session.
pub fn panel_view_url(base_url: &str, snapshot_key: &str, panel_id: i64) -> String {
    format!("{base_url}/dashboard/snapshot/{snapshot_key}?viewPanel={panel_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expiry_floor_applies_below_threshold() {
        let now = Utc::now();
        let floor = Duration::from_secs(2 * 24 * 3600);

        // Requested one day, floored to two.
        let expiry = now + chrono::Duration::days(1);
        assert_eq!(effective_expiry_secs(expiry, now, floor), 172800);

        // Requests in the past also land on the floor.
        let expired = now - chrono::Duration::hours(1);
        assert_eq!(effective_expiry_secs(expired, now, floor), 172800);
    }

    #[test]
    fn test_expiry_above_floor_passes_through() {
        let now = Utc::now();
        let floor = Duration::from_secs(900);
        let expiry = now + chrono::Duration::hours(1);
        assert_eq!(effective_expiry_secs(expiry, now, floor), 3600);
    }

    #[test]
    fn test_window_validation() {
        let now = Utc::now();
        let ok = TimeWindow {
            from: now - chrono::Duration::hours(1),
            to: now,
        };
        assert!(ok.validate().is_ok());

        let inverted = TimeWindow {
            from: now,
            to: now - chrono::Duration::hours(1),
        };
        assert!(matches!(
            inverted.validate(),
            Err(GrafanaError::InvalidWindow { .. })
        ));

        // Equal bounds fail too: start must be strictly before end.
        let degenerate = TimeWindow { from: now, to: now };
        assert!(degenerate.validate().is_err());
    }

    #[test]
    fn test_time_range_rewrite() {
        let dashboard = json!({
            "title": "t",
            "time": {"from": "now-6h", "to": "now"},
            "panels": []
        });
        let window = TimeWindow {
            from: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            to: DateTime::from_timestamp(1_700_086_400, 0).unwrap(),
        };

        let rewritten = with_time_range(&dashboard, window).unwrap();
        assert_eq!(rewritten["time"]["from"], json!(1_700_000_000_i64));
        assert_eq!(rewritten["time"]["to"], json!(1_700_086_400_i64));

        // Input untouched
        assert_eq!(dashboard["time"]["from"], json!("now-6h"));
    }

    #[test]
    fn test_time_range_inserted_when_missing() {
        let dashboard = json!({"title": "t", "panels": []});
        let window = TimeWindow {
            from: DateTime::from_timestamp(100, 0).unwrap(),
            to: DateTime::from_timestamp(200, 0).unwrap(),
        };

        let rewritten = with_time_range(&dashboard, window).unwrap();
        assert_eq!(rewritten["time"]["from"], json!(100));
        assert_eq!(rewritten["time"]["to"], json!(200));
    }

    #[test]
    fn test_panel_view_url() {
        assert_eq!(
            panel_view_url("http://grafana.internal:3000", "abc123", 7),
            "http://grafana.internal:3000/dashboard/snapshot/abc123?viewPanel=7"
        );
    }
}
