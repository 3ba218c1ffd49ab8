//! Event-to-notification rendering and the background dispatcher.
//!
//! [`NotificationDispatcher`] subscribes to the [`EventBus`](crate::EventBus)
//! and renders each event into plain-text [`OutgoingMessage`]s, one per
//! recipient. Invitations name their recipient in the payload; report events
//! go to the addresses a [`RecipientDirectory`] returns for the event's
//! organization. Messages go out over SMTP when configured and are logged
//! otherwise. Failures never reach the publisher.

use std::sync::Arc;

use async_trait::async_trait;
use kontrol_core::types::DbId;
use tokio::sync::broadcast;

use crate::bus::PlatformEvent;
use crate::delivery::email::EmailDelivery;
use crate::event_types;

/// A rendered plain-text notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Someone a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("Recipient lookup failed: {0}")]
pub struct RecipientLookupError(pub String);

/// Source of recipients for events that do not name one.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Who is told about inspection reports of `organization_id`.
    async fn report_recipients(
        &self,
        organization_id: DbId,
    ) -> Result<Vec<Recipient>, RecipientLookupError>;
}

/// Whether `event_type` is one of the report lifecycle events.
pub fn is_report_event(event_type: &str) -> bool {
    matches!(
        event_type,
        event_types::REPORT_FINALIZED
            | event_types::REPORT_FOLLOW_UP_REQUIRED
            | event_types::REPORT_FOLLOW_UP_UPDATED
            | event_types::REPORT_FOLLOW_UP_RESOLVED
    )
}

/// The recipient named in the event payload, if any.
pub fn payload_recipient(event: &PlatformEvent) -> Option<Recipient> {
    let email = event.payload_str("recipient_email")?;
    Some(Recipient {
        email: email.to_string(),
        name: event.payload_str("recipient_name").map(str::to_string),
    })
}

/// Render `event` for `recipient`. `None` for event types that are not
/// mailed.
pub fn render_message(event: &PlatformEvent, recipient: &Recipient) -> Option<OutgoingMessage> {
    let greeting = match &recipient.name {
        Some(name) => format!("Hello {name},"),
        None => "Hello,".to_string(),
    };
    let control = event.payload_str("control_name").unwrap_or("an inspection");
    let report_id = event
        .payload
        .get("report_id")
        .and_then(serde_json::Value::as_i64)
        .map(|id| format!(" #{id}"))
        .unwrap_or_default();

    let (subject, detail) = match event.event_type.as_str() {
        event_types::USER_INVITED => {
            let org = event.payload_str("organization_name").unwrap_or("Kontrol");
            let role = event.payload_str("role").unwrap_or("user");
            (
                format!("You have been invited to {org}"),
                format!("You have been added to {org} with the role \"{role}\"."),
            )
        }
        event_types::REPORT_FINALIZED => {
            let result = event.payload_str("overall_result").unwrap_or("unknown");
            (
                format!("Inspection report{report_id} finalized"),
                format!("The inspection of {control} was finalized with result: {result}."),
            )
        }
        event_types::REPORT_FOLLOW_UP_REQUIRED => (
            format!("Follow-up required for report{report_id}"),
            format!("The inspection of {control} has items that were not approved and needs follow-up."),
        ),
        event_types::REPORT_FOLLOW_UP_UPDATED => {
            let date = event.payload_str("follow_up_date").unwrap_or("not scheduled");
            let mut detail = format!("The follow-up for {control} is scheduled for {date}.");
            if let Some(notes) = event.payload_str("follow_up_notes") {
                detail.push_str(&format!("\nNotes: {notes}"));
            }
            (format!("Follow-up updated for report{report_id}"), detail)
        }
        event_types::REPORT_FOLLOW_UP_RESOLVED => (
            format!("Follow-up resolved for report{report_id}"),
            format!("The follow-up for {control} has been marked resolved."),
        ),
        other => {
            tracing::debug!(event_type = other, "No notification template for event");
            return None;
        }
    };

    Some(OutgoingMessage {
        to: recipient.email.clone(),
        subject,
        body: format!("{greeting}\n\n{detail}\n"),
    })
}

/// Background consumer that delivers notifications for bus events.
pub struct NotificationDispatcher {
    email: Option<EmailDelivery>,
    directory: Option<Arc<dyn RecipientDirectory>>,
}

impl NotificationDispatcher {
    /// `None` disables SMTP; messages are then only logged.
    pub fn new(email: Option<EmailDelivery>) -> Self {
        Self {
            email,
            directory: None,
        }
    }

    /// Resolve recipients of report events through `directory`.
    pub fn with_directory(mut self, directory: Arc<dyn RecipientDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Run until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.dispatch(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification dispatcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Everyone `event` should be sent to.
    async fn recipients_for(&self, event: &PlatformEvent) -> Vec<Recipient> {
        if let Some(recipient) = payload_recipient(event) {
            return vec![recipient];
        }
        if !is_report_event(&event.event_type) {
            return Vec::new();
        }
        let (Some(directory), Some(organization_id)) = (&self.directory, event.organization_id)
        else {
            return Vec::new();
        };
        match directory.report_recipients(organization_id).await {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    event_type = %event.event_type,
                    organization_id,
                    "Failed to look up notification recipients"
                );
                Vec::new()
            }
        }
    }

    async fn dispatch(&self, event: &PlatformEvent) {
        let recipients = self.recipients_for(event).await;
        if recipients.is_empty() {
            tracing::info!(
                event_type = %event.event_type,
                organization_id = ?event.organization_id,
                "Event has no notification recipients"
            );
            return;
        }
        for recipient in &recipients {
            let Some(message) = render_message(event, recipient) else {
                return;
            };
            self.deliver(event, &message).await;
        }
    }

    async fn deliver(&self, event: &PlatformEvent, message: &OutgoingMessage) {
        match &self.email {
            Some(email) => {
                if let Err(e) = email.deliver(message).await {
                    tracing::error!(
                        error = %e,
                        event_type = %event.event_type,
                        to = %message.to,
                        "Failed to deliver notification"
                    );
                }
            }
            None => {
                tracing::info!(
                    event_type = %event.event_type,
                    to = %message.to,
                    subject = %message.subject,
                    "Notification (SMTP not configured)"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::EventBus;

    struct FixedDirectory(Vec<Recipient>);

    #[async_trait]
    impl RecipientDirectory for FixedDirectory {
        async fn report_recipients(
            &self,
            _organization_id: DbId,
        ) -> Result<Vec<Recipient>, RecipientLookupError> {
            Ok(self.0.clone())
        }
    }

    struct FailingDirectory;

    #[async_trait]
    impl RecipientDirectory for FailingDirectory {
        async fn report_recipients(
            &self,
            _organization_id: DbId,
        ) -> Result<Vec<Recipient>, RecipientLookupError> {
            Err(RecipientLookupError("pool timed out".into()))
        }
    }

    fn admin() -> Recipient {
        Recipient {
            email: "ada@acme.io".into(),
            name: Some("Ada Admin".into()),
        }
    }

    fn follow_up_required() -> PlatformEvent {
        PlatformEvent::new(event_types::REPORT_FOLLOW_UP_REQUIRED)
            .with_organization(1)
            .with_payload(json!({"report_id": 12, "control_name": "Fire Extinguishers"}))
    }

    #[test]
    fn invitation_message() {
        let event = PlatformEvent::new(event_types::USER_INVITED).with_payload(json!({
            "recipient_email": "dana@example.com",
            "recipient_name": "Dana Reyes",
            "role": "inspector",
            "organization_name": "Acme Facilities",
        }));
        let recipient = payload_recipient(&event).unwrap();
        let message = render_message(&event, &recipient).unwrap();
        assert_eq!(message.to, "dana@example.com");
        assert_eq!(message.subject, "You have been invited to Acme Facilities");
        assert!(message.body.starts_with("Hello Dana Reyes,"));
        assert!(message.body.contains("\"inspector\""));
    }

    #[test]
    fn follow_up_updated_includes_date_and_notes() {
        let event = PlatformEvent::new(event_types::REPORT_FOLLOW_UP_UPDATED).with_payload(json!({
            "report_id": 12,
            "control_name": "Fire Extinguishers",
            "follow_up_date": "2024-07-22",
            "follow_up_notes": "scheduled recharge",
        }));
        let message = render_message(&event, &admin()).unwrap();
        assert_eq!(message.to, "ada@acme.io");
        assert_eq!(message.subject, "Follow-up updated for report #12");
        assert!(message.body.starts_with("Hello Ada Admin,"));
        assert!(message.body.contains("scheduled for 2024-07-22"));
        assert!(message.body.contains("Notes: scheduled recharge"));
    }

    #[test]
    fn unknown_event_types_are_not_rendered() {
        let event = PlatformEvent::new("control.archived");
        assert!(render_message(&event, &admin()).is_none());
    }

    #[tokio::test]
    async fn report_events_go_to_directory_recipients() {
        let dispatcher = NotificationDispatcher::new(None)
            .with_directory(Arc::new(FixedDirectory(vec![admin()])));
        let recipients = dispatcher.recipients_for(&follow_up_required()).await;
        assert_eq!(recipients, vec![admin()]);

        let message = render_message(&follow_up_required(), &recipients[0]).unwrap();
        assert_eq!(message.subject, "Follow-up required for report #12");
    }

    #[tokio::test]
    async fn payload_recipient_takes_precedence_over_directory() {
        let dispatcher = NotificationDispatcher::new(None)
            .with_directory(Arc::new(FixedDirectory(vec![admin()])));
        let event = PlatformEvent::new(event_types::USER_INVITED)
            .with_organization(1)
            .with_payload(json!({"recipient_email": "dana@example.com"}));
        let recipients = dispatcher.recipients_for(&event).await;
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].email, "dana@example.com");
        assert_eq!(recipients[0].name, None);
    }

    #[tokio::test]
    async fn report_events_without_directory_or_organization_have_no_recipients() {
        let plain = NotificationDispatcher::new(None);
        assert!(plain.recipients_for(&follow_up_required()).await.is_empty());

        let with_directory = NotificationDispatcher::new(None)
            .with_directory(Arc::new(FixedDirectory(vec![admin()])));
        let unscoped = PlatformEvent::new(event_types::REPORT_FINALIZED);
        assert!(with_directory.recipients_for(&unscoped).await.is_empty());

        let other = PlatformEvent::new("control.archived").with_organization(1);
        assert!(with_directory.recipients_for(&other).await.is_empty());
    }

    #[tokio::test]
    async fn failed_lookup_yields_no_recipients() {
        let dispatcher =
            NotificationDispatcher::new(None).with_directory(Arc::new(FailingDirectory));
        assert!(dispatcher.recipients_for(&follow_up_required()).await.is_empty());
    }

    #[tokio::test]
    async fn dispatcher_stops_when_bus_dropped() {
        let bus = EventBus::default();
        let dispatcher = NotificationDispatcher::new(None)
            .with_directory(Arc::new(FixedDirectory(vec![admin()])));
        let handle = tokio::spawn(dispatcher.run(bus.subscribe()));
        bus.publish(follow_up_required());
        bus.publish(PlatformEvent::new(event_types::USER_INVITED).with_payload(json!({
            "recipient_email": "dana@example.com",
        })));
        drop(bus);
        handle.await.unwrap();
    }
}
