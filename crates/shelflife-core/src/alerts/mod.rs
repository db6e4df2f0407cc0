//! Expiry alerts: selecting due items and handing a digest to a notifier.

mod outbox;

pub use outbox::OutboxNotifier;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::NotifyError;
use crate::inventory::{days_until, InventoryItem, ItemStatus};

/// Subject line of every alert digest.
pub const ALERT_SUBJECT: &str = "Smart Expiry Alert";

/// Delivers a subject and plain-text body somewhere a person will read it.
pub trait Notifier {
    fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// An item that is about to expire, or already has.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub item_id: u64,
    pub name: String,
    pub expiry_date: NaiveDate,
    pub days_left: i64,
}

/// Active items with at most `alert_days` days left, soonest first.
pub fn build_alerts(items: &[InventoryItem], today: NaiveDate, alert_days: i64) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = items
        .iter()
        .filter(|item| item.status == ItemStatus::Active)
        .filter_map(|item| {
            let days_left = days_until(item.expiry_date, today);
            (days_left <= alert_days).then(|| Alert {
                item_id: item.id,
                name: item.name.clone(),
                expiry_date: item.expiry_date,
                days_left,
            })
        })
        .collect();
    alerts.sort_by_key(|alert| (alert.days_left, alert.item_id));
    alerts
}

/// One message covering every due item.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDigest {
    alerts: Vec<Alert>,
}

impl AlertDigest {
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self { alerts }
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn subject(&self) -> &'static str {
        ALERT_SUBJECT
    }

    pub fn body(&self) -> String {
        let lines: Vec<String> = self
            .alerts
            .iter()
            .map(|a| {
                format!(
                    "- {} (expires {} | in {} days)",
                    a.name,
                    a.expiry_date.format("%Y-%m-%d"),
                    a.days_left
                )
            })
            .collect();
        format!("The following items are nearing expiry:\n\n{}", lines.join("\n"))
    }

    /// Send through `notifier`. Returns whether anything was sent.
    pub fn send(&self, notifier: &dyn Notifier) -> Result<bool, NotifyError> {
        if self.is_empty() {
            debug!("No items due, nothing to send");
            return Ok(false);
        }
        notifier.send(self.subject(), &self.body())?;
        info!("Sent expiry alert for {} items", self.alerts.len());
        Ok(true)
    }
}

/// Build and send the digest for `items`. Returns the number of items alerted.
pub fn send_due_alerts(
    items: &[InventoryItem],
    today: NaiveDate,
    alert_days: i64,
    notifier: &dyn Notifier,
) -> Result<usize, NotifyError> {
    let digest = AlertDigest::new(build_alerts(items, today, alert_days));
    digest.send(notifier)?;
    Ok(digest.alerts().len())
}

/// Notifier that only logs the digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!("{}\n{}", subject, body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(id: u64, name: &str, expiry: NaiveDate, status: ItemStatus) -> InventoryItem {
        InventoryItem {
            id,
            name: name.to_string(),
            expiry_date: expiry,
            quantity: 1,
            image_path: None,
            risk_score: 0.2,
            status,
            added_at: Utc::now(),
            consumed_at: None,
        }
    }

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<(String, String)>>,
    }

    impl Notifier for Recorder {
        fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
            self.sent.borrow_mut().push((subject.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn pantry() -> Vec<InventoryItem> {
        vec![
            item(1, "Milk", date(2026, 3, 2), ItemStatus::Active),
            item(2, "Cheese", date(2026, 4, 1), ItemStatus::Active),
            item(3, "Bread", date(2026, 2, 25), ItemStatus::Active),
            item(4, "Yogurt", date(2026, 2, 28), ItemStatus::Consumed),
        ]
    }

    #[test]
    fn test_build_alerts_selects_due_active_items() {
        let alerts = build_alerts(&pantry(), date(2026, 2, 27), 3);
        let names: Vec<&str> = alerts.iter().map(|a| a.name.as_str()).collect();

        assert_eq!(names, vec!["Bread", "Milk"]);
        assert_eq!(alerts[0].days_left, -2);
        assert_eq!(alerts[1].days_left, 3);
    }

    #[test]
    fn test_digest_body() {
        let digest = AlertDigest::new(build_alerts(&pantry(), date(2026, 2, 27), 3));

        assert_eq!(digest.subject(), "Smart Expiry Alert");
        assert_eq!(
            digest.body(),
            "The following items are nearing expiry:\n\n\
             - Bread (expires 2026-02-25 | in -2 days)\n\
             - Milk (expires 2026-03-02 | in 3 days)"
        );
    }

    #[test]
    fn test_send_due_alerts() {
        let recorder = Recorder::default();
        let count = send_due_alerts(&pantry(), date(2026, 2, 27), 3, &recorder).unwrap();

        assert_eq!(count, 2);
        let sent = recorder.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ALERT_SUBJECT);
    }

    #[test]
    fn test_empty_digest_sends_nothing() {
        let recorder = Recorder::default();
        let count = send_due_alerts(&pantry(), date(2026, 1, 1), 3, &recorder).unwrap();

        assert_eq!(count, 0);
        assert!(recorder.sent.borrow().is_empty());
    }
}
