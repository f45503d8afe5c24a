//! Context publication and subscription

use crate::config::HostConfig;
use crate::frame::{ContextFrame, HostId};
use context_types::{decode, ContextError, EditorContext, ValidationPolicy};
use editor_state::EditorState;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Context host error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Snapshot rejected: {0}")]
    Rejected(#[from] ContextError),

    #[error("Context host closed")]
    Closed,
}

/// Context host service
///
/// Publishes whole snapshots. Only the latest frame is retained, so a slow
/// subscriber skips superseded snapshots instead of queueing them.
#[derive(Debug)]
pub struct ContextHost {
    host_id: HostId,
    policy: ValidationPolicy,
    revision: u64,
    sender: watch::Sender<Option<ContextFrame>>,
}

impl ContextHost {
    pub fn new(config: &HostConfig) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            host_id: HostId::new(),
            policy: config.policy,
            revision: 0,
            sender,
        }
    }

    pub fn host_id(&self) -> HostId {
        self.host_id
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Revision of the latest frame, 0 before the first publish
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn latest(&self) -> Option<ContextFrame> {
        self.sender.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn subscribe(&self) -> ContextSubscriber {
        ContextSubscriber {
            receiver: self.sender.subscribe(),
            last_seen: 0,
        }
    }

    /// Validates and publishes a snapshot, returning its revision
    ///
    /// Under the strict policy an inconsistent snapshot is rejected and
    /// nothing is published.
    pub fn publish(&mut self, context: EditorContext) -> Result<u64, HostError> {
        let context = self.validate(context)?;
        Ok(self.commit(context))
    }

    /// Decodes a wire snapshot and publishes it
    pub fn publish_encoded(&mut self, bytes: &[u8]) -> Result<u64, HostError> {
        let context = decode(bytes)?;
        self.publish(context)
    }

    pub fn publish_state(&mut self, state: &EditorState) -> Result<u64, HostError> {
        self.publish(state.snapshot())
    }

    /// Publishes only if the snapshot differs from the latest frame
    ///
    /// The comparison uses the snapshot as it would be published, after the
    /// policy ran. Returns `None` when the publish was skipped.
    pub fn publish_if_changed(&mut self, context: EditorContext) -> Result<Option<u64>, HostError> {
        let context = self.validate(context)?;
        let fingerprint = context.fingerprint();
        let unchanged = self
            .sender
            .borrow()
            .as_ref()
            .is_some_and(|frame| frame.context.fingerprint() == fingerprint);
        if unchanged {
            debug!(host = %self.host_id, revision = self.revision, "snapshot unchanged, skipped");
            return Ok(None);
        }
        Ok(Some(self.commit(context)))
    }

    fn validate(&self, context: EditorContext) -> Result<EditorContext, HostError> {
        let validated = match self.policy.enforce(context) {
            Ok(validated) => validated,
            Err(err) => {
                warn!(host = %self.host_id, policy = %self.policy, reason = %err, "rejected snapshot");
                return Err(err.into());
            }
        };
        if validated.was_repaired() {
            debug!(
                host = %self.host_id,
                repairs = validated.repairs.len(),
                "publishing repaired snapshot"
            );
        }
        Ok(validated.into_context())
    }

    fn commit(&mut self, context: EditorContext) -> u64 {
        self.revision += 1;
        let frame = ContextFrame::new(self.host_id, self.revision, context);
        self.sender.send_replace(Some(frame));
        debug!(host = %self.host_id, revision = self.revision, "published context");
        self.revision
    }
}

/// Receiving side of a context host
///
/// Remembers the last revision it handed out, so every frame is observed
/// at most once.
#[derive(Debug, Clone)]
pub struct ContextSubscriber {
    receiver: watch::Receiver<Option<ContextFrame>>,
    last_seen: u64,
}

impl ContextSubscriber {
    /// Latest published frame, whether seen or not
    pub fn current(&self) -> Option<ContextFrame> {
        self.receiver.borrow().clone()
    }

    pub fn has_update(&self) -> bool {
        self.receiver
            .borrow()
            .as_ref()
            .is_some_and(|frame| frame.revision > self.last_seen)
    }

    /// Takes the latest frame if it has not been seen yet
    pub fn try_next(&mut self) -> Option<ContextFrame> {
        let frame = self
            .receiver
            .borrow_and_update()
            .as_ref()
            .filter(|frame| frame.revision > self.last_seen)
            .cloned()?;
        self.last_seen = frame.revision;
        Some(frame)
    }

    /// Waits for a frame newer than the last one seen
    ///
    /// An unseen frame is returned even after the host is gone; after that
    /// the call fails with [`HostError::Closed`].
    pub async fn changed(&mut self) -> Result<ContextFrame, HostError> {
        loop {
            if let Some(frame) = self.try_next() {
                return Ok(frame);
            }
            self.receiver
                .changed()
                .await
                .map_err(|_| HostError::Closed)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_types::{BufferEntry, EditorMode, Inconsistency, TerminalSize};
    use std::collections::BTreeMap;

    fn consistent() -> EditorContext {
        let mut buffers = BTreeMap::new();
        buffers.insert("main".to_string(), BufferEntry::Unset);
        EditorContext::new(
            buffers,
            vec!["main".into()],
            "main",
            EditorMode::Normal,
            TerminalSize::new(80, 24),
            Vec::new(),
        )
    }

    fn hidden_focus() -> EditorContext {
        let mut buffers = BTreeMap::new();
        buffers.insert("main".to_string(), BufferEntry::Unset);
        buffers.insert("side".to_string(), BufferEntry::Unset);
        EditorContext::new(
            buffers,
            vec!["main".into()],
            "side",
            EditorMode::Normal,
            TerminalSize::new(80, 24),
            Vec::new(),
        )
    }

    #[test]
    fn test_new_host_is_empty() {
        let host = ContextHost::new(&HostConfig::default());
        assert_eq!(host.revision(), 0);
        assert!(host.latest().is_none());
        assert_eq!(host.subscriber_count(), 0);
        assert_eq!(host.policy(), ValidationPolicy::Strict);
    }

    #[test]
    fn test_revisions_start_at_one_and_increase() {
        let mut host = ContextHost::new(&HostConfig::default());
        assert_eq!(host.publish(consistent()).unwrap(), 1);
        assert_eq!(host.publish(consistent()).unwrap(), 2);

        let latest = host.latest().unwrap();
        assert_eq!(latest.revision, 2);
        assert_eq!(latest.host_id, host.host_id());
    }

    #[test]
    fn test_strict_rejection_publishes_nothing() {
        let mut host = ContextHost::new(&HostConfig::default());
        host.publish(consistent()).unwrap();

        let err = host.publish(hidden_focus()).unwrap_err();
        assert_eq!(
            err,
            HostError::Rejected(ContextError::InconsistentContext(vec![
                Inconsistency::FocusNotShown {
                    focus: "side".into()
                }
            ]))
        );
        assert_eq!(host.revision(), 1);
        assert_eq!(host.latest().unwrap().context.focus_buffer(), "main");
    }

    #[test]
    fn test_lenient_publishes_repaired() {
        let config = HostConfig::new().with_policy(ValidationPolicy::Lenient);
        let mut host = ContextHost::new(&config);
        host.publish(hidden_focus()).unwrap();

        let frame = host.latest().unwrap();
        assert_eq!(frame.context.focus_buffer(), "main");
        assert!(frame.context.is_consistent());
    }

    #[test]
    fn test_publish_encoded_rejects_malformed() {
        let mut host = ContextHost::new(&HostConfig::default());
        let err = host.publish_encoded(b"{\"buffers\": 3}").unwrap_err();
        assert!(matches!(err, HostError::Rejected(ContextError::MalformedContext { .. })));
        assert!(host.latest().is_none());
    }

    #[test]
    fn test_publish_if_changed_skips_duplicates() {
        let mut host = ContextHost::new(&HostConfig::default());
        assert_eq!(host.publish_if_changed(consistent()).unwrap(), Some(1));
        assert_eq!(host.publish_if_changed(consistent()).unwrap(), None);
        assert_eq!(host.publish_if_changed(EditorContext::empty()).unwrap(), Some(2));
    }

    #[test]
    fn test_publish_if_changed_compares_repaired_snapshot() {
        let config = HostConfig::new().with_policy(ValidationPolicy::Lenient);
        let mut host = ContextHost::new(&config);
        let mut subscriber = host.subscribe();

        assert_eq!(host.publish_if_changed(hidden_focus()).unwrap(), Some(1));
        assert_eq!(host.publish_if_changed(hidden_focus()).unwrap(), None);
        assert_eq!(host.publish_if_changed(hidden_focus()).unwrap(), None);
        assert_eq!(host.revision(), 1);

        // The repaired form of the snapshot is also unchanged
        let repaired = host.latest().unwrap().context.as_ref().clone();
        assert_eq!(host.publish_if_changed(repaired).unwrap(), None);

        assert_eq!(subscriber.try_next().unwrap().revision, 1);
        assert!(!subscriber.has_update());
    }

    #[test]
    fn test_publish_if_changed_strict_rejects_before_comparing() {
        let mut host = ContextHost::new(&HostConfig::default());
        host.publish(consistent()).unwrap();
        assert!(host.publish_if_changed(hidden_focus()).is_err());
        assert_eq!(host.revision(), 1);
    }

    #[test]
    fn test_subscriber_try_next() {
        let mut host = ContextHost::new(&HostConfig::default());
        let mut subscriber = host.subscribe();
        assert_eq!(host.subscriber_count(), 1);
        assert!(subscriber.try_next().is_none());
        assert!(!subscriber.has_update());

        host.publish(consistent()).unwrap();
        assert!(subscriber.has_update());
        assert_eq!(subscriber.try_next().unwrap().revision, 1);
        assert!(subscriber.try_next().is_none());
        assert!(!subscriber.has_update());

        // current() always shows the latest frame
        assert_eq!(subscriber.current().unwrap().revision, 1);
    }

    #[test]
    fn test_subscriber_skips_superseded_frames() {
        let mut host = ContextHost::new(&HostConfig::default());
        let mut subscriber = host.subscribe();

        host.publish(consistent()).unwrap();
        host.publish(EditorContext::empty()).unwrap();
        host.publish(consistent()).unwrap();

        let frame = subscriber.try_next().unwrap();
        assert_eq!(frame.revision, 3);
        assert!(subscriber.try_next().is_none());
    }

    #[test]
    fn test_late_subscriber_sees_latest() {
        let mut host = ContextHost::new(&HostConfig::default());
        host.publish(consistent()).unwrap();

        let mut subscriber = host.subscribe();
        assert!(subscriber.has_update());
        assert_eq!(subscriber.try_next().unwrap().revision, 1);
    }

    #[test]
    fn test_dropped_subscriber_is_released() {
        let host = ContextHost::new(&HostConfig::default());
        let subscriber = host.subscribe();
        let another = subscriber.clone();
        assert_eq!(host.subscriber_count(), 2);
        drop(subscriber);
        drop(another);
        assert_eq!(host.subscriber_count(), 0);
    }
}
