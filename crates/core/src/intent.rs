//! Reconciliation intents and mutation-step planning.
//!
//! An intent is the pure output of classification: the set of group and tag
//! deltas one webhook implies. The planner flattens an intent into an
//! ordered list of [`MutationStep`]s so the reconciler can execute and
//! report on each remote call independently.

use core::fmt;
use std::collections::BTreeSet;

use crate::email::Email;

/// The group/tag deltas to apply for one webhook event.
///
/// Pure data; no side effects until the reconciler executes it. Sets are
/// ordered so planning is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationIntent {
    /// Subscriber the deltas apply to.
    pub email: Email,
    /// Customer name, populated only when the subscriber may be created
    /// with it (completed purchases).
    pub name: Option<String>,
    /// Groups the subscriber should be added to.
    pub groups_to_add: BTreeSet<String>,
    /// Groups the subscriber should be removed from.
    pub groups_to_remove: BTreeSet<String>,
    /// Tags to attach to the subscriber.
    pub tags_to_add: BTreeSet<String>,
    /// Tags to detach from the subscriber.
    pub tags_to_remove: BTreeSet<String>,
    /// When set, the whole intent is dropped if the subscriber already
    /// belongs to this group (abandoned-cart dedup guard).
    pub guard_group: Option<String>,
}

impl ReconciliationIntent {
    /// An intent with no deltas for the given subscriber.
    #[must_use]
    pub fn empty(email: Email) -> Self {
        Self {
            email,
            name: None,
            groups_to_add: BTreeSet::new(),
            groups_to_remove: BTreeSet::new(),
            tags_to_add: BTreeSet::new(),
            tags_to_remove: BTreeSet::new(),
            guard_group: None,
        }
    }
}

/// One remote mutation the reconciler will attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationStep {
    /// Add the subscriber to the named group.
    AddToGroup(String),
    /// Remove the subscriber from the named group.
    RemoveFromGroup(String),
    /// Ensure the named tag exists and attach it to the subscriber.
    AttachTag(String),
    /// Detach the named tag from the subscriber, if the tag exists.
    DetachTag(String),
}

impl fmt::Display for MutationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddToGroup(name) => write!(f, "add to group \"{name}\""),
            Self::RemoveFromGroup(name) => write!(f, "remove from group \"{name}\""),
            Self::AttachTag(name) => write!(f, "attach tag \"{name}\""),
            Self::DetachTag(name) => write!(f, "detach tag \"{name}\""),
        }
    }
}

/// Flatten an intent into the ordered list of remote mutations.
///
/// Order: group additions, group removals, tag attachments, tag detachments.
/// Tag steps are omitted entirely when tag management is disabled.
#[must_use]
pub fn plan(intent: &ReconciliationIntent, tags_enabled: bool) -> Vec<MutationStep> {
    let mut steps = Vec::new();

    for group in &intent.groups_to_add {
        steps.push(MutationStep::AddToGroup(group.clone()));
    }
    for group in &intent.groups_to_remove {
        steps.push(MutationStep::RemoveFromGroup(group.clone()));
    }

    if tags_enabled {
        for tag in &intent.tags_to_add {
            steps.push(MutationStep::AttachTag(tag.clone()));
        }
        for tag in &intent.tags_to_remove {
            steps.push(MutationStep::DetachTag(tag.clone()));
        }
    }

    steps
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn intent() -> ReconciliationIntent {
        let mut intent = ReconciliationIntent::empty(Email::parse("a@x.com").unwrap());
        intent.groups_to_add.insert("Students".to_string());
        intent.groups_to_remove.insert("Cart Recovery".to_string());
        intent.tags_to_add.insert("bought".to_string());
        intent.tags_to_remove.insert("abandoned".to_string());
        intent.tags_to_remove.insert("refund".to_string());
        intent
    }

    #[test]
    fn test_plan_orders_groups_before_tags() {
        let steps = plan(&intent(), true);

        assert_eq!(
            steps,
            vec![
                MutationStep::AddToGroup("Students".to_string()),
                MutationStep::RemoveFromGroup("Cart Recovery".to_string()),
                MutationStep::AttachTag("bought".to_string()),
                MutationStep::DetachTag("abandoned".to_string()),
                MutationStep::DetachTag("refund".to_string()),
            ]
        );
    }

    #[test]
    fn test_plan_skips_tags_when_disabled() {
        let steps = plan(&intent(), false);

        assert_eq!(
            steps,
            vec![
                MutationStep::AddToGroup("Students".to_string()),
                MutationStep::RemoveFromGroup("Cart Recovery".to_string()),
            ]
        );
    }

    #[test]
    fn test_plan_empty_intent() {
        let empty = ReconciliationIntent::empty(Email::parse("a@x.com").unwrap());
        assert!(plan(&empty, true).is_empty());
    }

    #[test]
    fn test_step_display() {
        assert_eq!(
            MutationStep::AddToGroup("Students".to_string()).to_string(),
            "add to group \"Students\""
        );
        assert_eq!(
            MutationStep::DetachTag("refund".to_string()).to_string(),
            "detach tag \"refund\""
        );
    }
}
