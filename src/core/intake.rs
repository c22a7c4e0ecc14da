use crate::core::store::SessionState;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("Please paste your Drive link")]
    MissingLink,
}

/// Where a submitted link leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// First visit; the welcome notice comes before the target prompt.
    Welcome,
    Prepare,
}

pub fn parse_link(raw: &str) -> Result<String, IntakeError> {
    let link = raw.trim();
    if link.is_empty() {
        return Err(IntakeError::MissingLink);
    }
    Ok(link.to_string())
}

/// Store the link and stamp the start of a new session.
pub fn record_link(state: &mut SessionState, link: String, now: DateTime<Utc>) {
    state.drive_link = Some(link);
    state.drive_submitted_at = Some(now);
    state.session_started_at = Some(now.timestamp_millis());
}

pub fn route(state: &SessionState) -> Route {
    if state.has_visited {
        Route::Prepare
    } else {
        Route::Welcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_link_trims() {
        assert_eq!(
            parse_link("  https://drive.example/f/1 \n").unwrap(),
            "https://drive.example/f/1"
        );
        assert_eq!(parse_link("   "), Err(IntakeError::MissingLink));
        assert_eq!(
            IntakeError::MissingLink.to_string(),
            "Please paste your Drive link"
        );
    }

    #[test]
    fn test_record_link_stamps_session() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut state = SessionState {
            target_count: Some(8),
            ..SessionState::default()
        };
        record_link(&mut state, "https://drive.example/f/1".to_string(), now);

        assert_eq!(state.drive_link.as_deref(), Some("https://drive.example/f/1"));
        assert_eq!(state.drive_submitted_at, Some(now));
        assert_eq!(state.session_started_at, Some(now.timestamp_millis()));
        assert_eq!(state.target_count, Some(8));
    }

    #[test]
    fn test_route_by_first_visit() {
        let mut state = SessionState::default();
        assert_eq!(route(&state), Route::Welcome);
        state.has_visited = true;
        assert_eq!(route(&state), Route::Prepare);
    }
}
