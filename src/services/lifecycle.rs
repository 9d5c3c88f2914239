//! Campaign lifecycle: an explicit transition function over
//! `draft -> active <-> paused -> completed`. A draft may be started with
//! either `schedule` or `resume`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub use crate::db::models::CampaignStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CampaignEvent {
    /// Activate now and remember the requested send time.
    Schedule { at: NaiveDateTime },
    Resume,
    Pause,
    Complete,
}

impl CampaignEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CampaignEvent::Schedule { .. } => "schedule",
            CampaignEvent::Resume => "resume",
            CampaignEvent::Pause => "pause",
            CampaignEvent::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot {event} a campaign that is {from}")]
pub struct InvalidTransition {
    pub from: CampaignStatus,
    pub event: &'static str,
}

impl CampaignStatus {
    /// Next status for `event`, or the rejection when the event is not
    /// valid from the current status.
    pub fn apply(&self, event: &CampaignEvent) -> Result<CampaignStatus, InvalidTransition> {
        use CampaignStatus::*;

        let next = match (self, event) {
            (Draft | Paused, CampaignEvent::Schedule { .. }) => Active,
            (Draft | Paused, CampaignEvent::Resume) => Active,
            (Active, CampaignEvent::Pause) => Paused,
            (Draft | Active | Paused, CampaignEvent::Complete) => Completed,
            _ => {
                return Err(InvalidTransition {
                    from: *self,
                    event: event.name(),
                })
            }
        };

        Ok(next)
    }

    /// Events the UI may offer for a campaign in this status.
    pub fn allowed_events(&self) -> &'static [&'static str] {
        match self {
            CampaignStatus::Draft => &["schedule", "resume", "complete"],
            CampaignStatus::Active => &["pause", "complete"],
            CampaignStatus::Paused => &["schedule", "resume", "complete"],
            CampaignStatus::Completed => &[],
        }
    }

    /// Content and audience may only change before sending or while paused.
    pub fn is_editable(&self) -> bool {
        matches!(self, CampaignStatus::Draft | CampaignStatus::Paused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn schedule() -> CampaignEvent {
        CampaignEvent::Schedule {
            at: Utc::now().naive_utc(),
        }
    }

    fn all_events() -> Vec<CampaignEvent> {
        vec![
            schedule(),
            CampaignEvent::Resume,
            CampaignEvent::Pause,
            CampaignEvent::Complete,
        ]
    }

    #[test]
    fn happy_path() {
        let s = CampaignStatus::Draft;
        let s = s.apply(&schedule()).unwrap();
        assert_eq!(s, CampaignStatus::Active);
        let s = s.apply(&CampaignEvent::Pause).unwrap();
        assert_eq!(s, CampaignStatus::Paused);
        let s = s.apply(&CampaignEvent::Resume).unwrap();
        assert_eq!(s, CampaignStatus::Active);
        let s = s.apply(&CampaignEvent::Complete).unwrap();
        assert_eq!(s, CampaignStatus::Completed);
    }

    #[test]
    fn pausing_a_paused_campaign_is_rejected() {
        let err = CampaignStatus::Paused
            .apply(&CampaignEvent::Pause)
            .unwrap_err();
        assert_eq!(err.from, CampaignStatus::Paused);
        assert_eq!(err.event, "pause");
        assert_eq!(err.to_string(), "Cannot pause a campaign that is paused");
    }

    #[test]
    fn completed_is_terminal() {
        for event in all_events() {
            assert!(CampaignStatus::Completed.apply(&event).is_err());
        }
        assert!(CampaignStatus::Completed.allowed_events().is_empty());
    }

    #[test]
    fn draft_can_resume_but_not_pause() {
        assert_eq!(
            CampaignStatus::Draft.apply(&CampaignEvent::Resume),
            Ok(CampaignStatus::Active)
        );
        assert!(CampaignStatus::Draft.apply(&CampaignEvent::Pause).is_err());
        assert!(CampaignStatus::Active.apply(&schedule()).is_err());
        assert!(CampaignStatus::Active.apply(&CampaignEvent::Resume).is_err());
    }

    #[test]
    fn allowed_events_agree_with_apply() {
        for status in CampaignStatus::ALL {
            for event in all_events() {
                let allowed = status.allowed_events().contains(&event.name());
                assert_eq!(
                    status.apply(&event).is_ok(),
                    allowed,
                    "{} / {}",
                    status,
                    event.name()
                );
            }
        }
    }

    #[test]
    fn event_deserializes_from_tagged_json() {
        let event: CampaignEvent = serde_json::from_value(serde_json::json!({
            "event": "schedule",
            "at": "2025-07-01T09:00:00"
        }))
        .unwrap();
        assert_eq!(event.name(), "schedule");

        let event: CampaignEvent =
            serde_json::from_value(serde_json::json!({ "event": "pause" })).unwrap();
        assert_eq!(event, CampaignEvent::Pause);
    }
}
