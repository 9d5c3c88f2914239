//! Recipient milestones and the campaign funnel aggregate derived from them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::models::{CampaignMetrics, CampaignRecipient, RecipientStatus};

/// A delivery milestone a recipient can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Sent,
    Delivered,
    Opened,
    Clicked,
    Converted,
    Failed,
    Unsubscribed,
}

impl Milestone {
    /// Ordered funnel stages.
    pub const FUNNEL: [Milestone; 5] = [
        Milestone::Sent,
        Milestone::Delivered,
        Milestone::Opened,
        Milestone::Clicked,
        Milestone::Converted,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }

    /// This milestone plus every milestone it presupposes.
    pub fn with_implied(self) -> Vec<Milestone> {
        match Self::FUNNEL.iter().position(|m| *m == self) {
            Some(idx) => Self::FUNNEL[..=idx].to_vec(),
            // Failing or unsubscribing means a send was attempted.
            None => vec![Milestone::Sent, self],
        }
    }
}

/// The set of milestones a recipient has reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MilestoneSet(u8);

impl MilestoneSet {
    pub fn contains(&self, milestone: Milestone) -> bool {
        self.0 & milestone.bit() != 0
    }

    /// Insert `milestone` together with its implied predecessors.
    pub fn insert(&mut self, milestone: Milestone) {
        for m in milestone.with_implied() {
            self.0 |= m.bit();
        }
    }

    /// The milestones implied by a single status value.
    pub fn from_status(status: RecipientStatus) -> Self {
        let mut set = MilestoneSet::default();
        let milestone = match status {
            RecipientStatus::Pending => return set,
            RecipientStatus::Sent => Milestone::Sent,
            RecipientStatus::Delivered => Milestone::Delivered,
            RecipientStatus::Opened => Milestone::Opened,
            RecipientStatus::Clicked => Milestone::Clicked,
            RecipientStatus::Converted => Milestone::Converted,
            RecipientStatus::Failed => Milestone::Failed,
            RecipientStatus::Unsubscribed => Milestone::Unsubscribed,
        };
        set.insert(milestone);
        set
    }

    pub fn from_recipient(recipient: &CampaignRecipient) -> Self {
        let mut set = MilestoneSet::default();
        let stamps = [
            (Milestone::Sent, recipient.sent_at),
            (Milestone::Delivered, recipient.delivered_at),
            (Milestone::Opened, recipient.opened_at),
            (Milestone::Clicked, recipient.clicked_at),
            (Milestone::Converted, recipient.converted_at),
            (Milestone::Failed, recipient.failed_at),
            (Milestone::Unsubscribed, recipient.unsubscribed_at),
        ];
        for (milestone, at) in stamps {
            if at.is_some() {
                set.insert(milestone);
            }
        }
        set
    }

    /// Single status summarising the set: unsubscribed wins over failed,
    /// which wins over the furthest funnel stage.
    pub fn status(&self) -> RecipientStatus {
        if self.contains(Milestone::Unsubscribed) {
            return RecipientStatus::Unsubscribed;
        }
        if self.contains(Milestone::Failed) {
            return RecipientStatus::Failed;
        }
        match Milestone::FUNNEL.iter().rev().find(|m| self.contains(**m)) {
            Some(Milestone::Converted) => RecipientStatus::Converted,
            Some(Milestone::Clicked) => RecipientStatus::Clicked,
            Some(Milestone::Opened) => RecipientStatus::Opened,
            Some(Milestone::Delivered) => RecipientStatus::Delivered,
            Some(_) => RecipientStatus::Sent,
            None => RecipientStatus::Pending,
        }
    }
}

fn milestone_slot(recipient: &mut CampaignRecipient, milestone: Milestone) -> &mut Option<NaiveDateTime> {
    match milestone {
        Milestone::Sent => &mut recipient.sent_at,
        Milestone::Delivered => &mut recipient.delivered_at,
        Milestone::Opened => &mut recipient.opened_at,
        Milestone::Clicked => &mut recipient.clicked_at,
        Milestone::Converted => &mut recipient.converted_at,
        Milestone::Failed => &mut recipient.failed_at,
        Milestone::Unsubscribed => &mut recipient.unsubscribed_at,
    }
}

/// Stamp `milestone` (and any missing predecessor) on the recipient and
/// re-derive its status. Existing timestamps are kept. Returns whether
/// anything changed.
pub fn record_milestone(
    recipient: &mut CampaignRecipient,
    milestone: Milestone,
    at: NaiveDateTime,
) -> bool {
    let mut changed = false;
    for m in milestone.with_implied() {
        let slot = milestone_slot(recipient, m);
        if slot.is_none() {
            *slot = Some(at);
            changed = true;
        }
    }

    let status = MilestoneSet::from_recipient(recipient).status();
    if status != recipient.status {
        recipient.status = status;
        changed = true;
    }
    changed
}

/// Percentage of `part` over `whole`, 0 when `whole` is 0.
fn rate(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl CampaignMetrics {
    pub fn from_milestones<I>(sets: I, computed_at: NaiveDateTime) -> Self
    where
        I: IntoIterator<Item = MilestoneSet>,
    {
        let mut m = CampaignMetrics::default();

        for set in sets {
            m.total += 1;
            m.sent += set.contains(Milestone::Sent) as u64;
            m.delivered += set.contains(Milestone::Delivered) as u64;
            m.opened += set.contains(Milestone::Opened) as u64;
            m.clicked += set.contains(Milestone::Clicked) as u64;
            m.converted += set.contains(Milestone::Converted) as u64;
            // Terminal outcomes are counted by derived status so each
            // recipient lands in at most one of them.
            match set.status() {
                RecipientStatus::Failed => m.failed += 1,
                RecipientStatus::Unsubscribed => m.unsubscribed += 1,
                _ => {}
            }
        }

        m.delivery_rate = rate(m.delivered, m.total);
        m.open_rate = rate(m.opened, m.delivered);
        m.click_rate = rate(m.clicked, m.opened);
        m.conversion_rate = rate(m.converted, m.clicked);
        m.bounce_rate = rate(m.failed, m.total);
        m.unsubscribe_rate = rate(m.unsubscribed, m.delivered);
        m.computed_at = Some(computed_at);
        m
    }

    pub fn from_statuses<I>(statuses: I, computed_at: NaiveDateTime) -> Self
    where
        I: IntoIterator<Item = RecipientStatus>,
    {
        Self::from_milestones(statuses.into_iter().map(MilestoneSet::from_status), computed_at)
    }

    pub fn from_recipients(recipients: &[CampaignRecipient], computed_at: NaiveDateTime) -> Self {
        Self::from_milestones(recipients.iter().map(MilestoneSet::from_recipient), computed_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {expected}, got {actual}"
        );
    }

    fn pending_recipient() -> CampaignRecipient {
        let now = Utc::now().naive_utc();
        CampaignRecipient {
            id: "r1".to_string(),
            campaign_id: "c1".to_string(),
            customer_id: "cust1".to_string(),
            status: RecipientStatus::Pending,
            sent_at: None,
            delivered_at: None,
            opened_at: None,
            clicked_at: None,
            converted_at: None,
            failed_at: None,
            unsubscribed_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn funnel_from_six_statuses() {
        use RecipientStatus::*;
        let m = CampaignMetrics::from_statuses(
            [Sent, Delivered, Opened, Clicked, Converted, Failed],
            Utc::now().naive_utc(),
        );

        assert_eq!(m.total, 6);
        assert_eq!(m.sent, 6);
        assert_eq!(m.delivered, 4);
        assert_eq!(m.opened, 3);
        assert_eq!(m.clicked, 2);
        assert_eq!(m.converted, 1);
        assert_eq!(m.failed, 1);
        assert_eq!(m.unsubscribed, 0);

        approx(m.delivery_rate, 66.67);
        approx(m.open_rate, 75.0);
        approx(m.click_rate, 66.67);
        approx(m.conversion_rate, 50.0);
        approx(m.bounce_rate, 16.67);
        approx(m.unsubscribe_rate, 0.0);
    }

    #[test]
    fn pending_is_not_sent() {
        use RecipientStatus::*;
        let m = CampaignMetrics::from_statuses([Pending, Pending, Sent], Utc::now().naive_utc());
        assert_eq!(m.total, 3);
        assert_eq!(m.sent, 1);
        approx(m.delivery_rate, 0.0);
    }

    #[test]
    fn rates_are_zero_without_denominator() {
        let empty = CampaignMetrics::from_statuses([], Utc::now().naive_utc());
        assert_eq!(empty.total, 0);
        for r in [
            empty.delivery_rate,
            empty.open_rate,
            empty.click_rate,
            empty.conversion_rate,
            empty.bounce_rate,
            empty.unsubscribe_rate,
        ] {
            assert_eq!(r, 0.0);
            assert!(!r.is_nan());
        }

        // Delivered but never opened: click and conversion rates have a zero denominator.
        let m = CampaignMetrics::from_statuses(
            [RecipientStatus::Delivered, RecipientStatus::Failed],
            Utc::now().naive_utc(),
        );
        assert_eq!(m.click_rate, 0.0);
        assert_eq!(m.conversion_rate, 0.0);
        approx(m.bounce_rate, 50.0);
    }

    #[test]
    fn funnel_is_monotone_for_every_distribution() {
        use RecipientStatus::*;
        let all = [
            Pending,
            Sent,
            Delivered,
            Opened,
            Clicked,
            Converted,
            Failed,
            Unsubscribed,
        ];
        // Every multiset of up to three statuses.
        for a in all {
            for b in all {
                for c in all {
                    let m = CampaignMetrics::from_statuses([a, b, c], Utc::now().naive_utc());
                    assert!(m.total >= m.sent);
                    assert!(m.sent >= m.delivered);
                    assert!(m.delivered >= m.opened);
                    assert!(m.opened >= m.clicked);
                    assert!(m.clicked >= m.converted);
                    assert!(m.failed + m.unsubscribed <= m.total);
                }
            }
        }
    }

    #[test]
    fn recording_click_backfills_earlier_milestones() {
        let mut r = pending_recipient();
        let at = Utc::now().naive_utc();

        assert!(record_milestone(&mut r, Milestone::Clicked, at));
        assert_eq!(r.status, RecipientStatus::Clicked);
        assert_eq!(r.sent_at, Some(at));
        assert_eq!(r.delivered_at, Some(at));
        assert_eq!(r.opened_at, Some(at));
        assert_eq!(r.clicked_at, Some(at));
        assert_eq!(r.converted_at, None);

        // A late "opened" webhook does not move the status back nor the timestamp.
        let later = at + Duration::minutes(5);
        assert!(!record_milestone(&mut r, Milestone::Opened, later));
        assert_eq!(r.opened_at, Some(at));
        assert_eq!(r.status, RecipientStatus::Clicked);
    }

    #[test]
    fn unsubscribe_overrides_funnel_status() {
        let mut r = pending_recipient();
        let at = Utc::now().naive_utc();
        record_milestone(&mut r, Milestone::Delivered, at);
        record_milestone(&mut r, Milestone::Unsubscribed, at);
        assert_eq!(r.status, RecipientStatus::Unsubscribed);

        let set = MilestoneSet::from_recipient(&r);
        assert!(set.contains(Milestone::Delivered));
        let m = CampaignMetrics::from_recipients(&[r], at);
        assert_eq!(m.delivered, 1);
        assert_eq!(m.unsubscribed, 1);
        approx(m.unsubscribe_rate, 100.0);
    }

    #[test]
    fn status_round_trips_through_milestones() {
        use RecipientStatus::*;
        for status in [
            Pending,
            Sent,
            Delivered,
            Opened,
            Clicked,
            Converted,
            Failed,
            Unsubscribed,
        ] {
            assert_eq!(MilestoneSet::from_status(status).status(), status);
        }
    }
}
