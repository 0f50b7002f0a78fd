//! Subscriber reconciliation against the directory service.
//!
//! Takes the intent computed by the classifier and converges the remote
//! subscriber record toward it: resolve or create the subscriber, then
//! apply each planned group/tag mutation sequentially. Steps are
//! best-effort and independent; one failing remote call is recorded in the
//! report and the remaining steps still run. The remote service is the
//! source of truth, so a later webhook converges whatever a partial
//! application left behind.

use kiwi_relay_core::{MutationStep, ReconciliationIntent, plan};
use tracing::{debug, warn};

use crate::directory::{Directory, DirectoryError, Subscriber};

/// Failures that abort a reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The subscriber could not be resolved or created. Without a remote id
    /// no further step is meaningful.
    #[error("failed to resolve or create subscriber {email}: {source}")]
    Subscriber {
        email: String,
        #[source]
        source: DirectoryError,
    },
}

/// Switches that shape reconciliation, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Plan but never issue remote calls.
    pub dry_run: bool,
    /// Apply tag mutations in addition to group mutations.
    pub tags_enabled: bool,
}

/// What happened to one planned mutation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// The remote call succeeded.
    Applied,
    /// The referenced group or tag does not exist remotely; nothing to do.
    SkippedMissing,
    /// The remote call failed; the failure was logged and later steps ran.
    Failed(String),
}

/// One executed step and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: MutationStep,
    pub status: StepStatus,
}

/// Best-effort report of one reconciliation.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    /// Remote id of the subscriber the steps applied to.
    pub subscriber_id: String,
    /// Whether the subscriber was created by this reconciliation.
    pub created: bool,
    /// Outcome of every planned step, in execution order.
    pub steps: Vec<StepReport>,
}

impl ReconcileReport {
    /// Number of steps that applied cleanly.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.count(|status| matches!(status, StepStatus::Applied))
    }

    /// Number of steps skipped because their group/tag is absent remotely.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, StepStatus::SkippedMissing))
    }

    /// Number of steps that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, StepStatus::Failed(_)))
    }

    fn count(&self, matches: impl Fn(&StepStatus) -> bool) -> usize {
        self.steps
            .iter()
            .filter(|report| matches(&report.status))
            .count()
    }
}

/// Terminal outcome of a reconciliation.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// Steps were executed; see the report for per-step results.
    Applied(ReconcileReport),
    /// The subscriber is already in the guard group; nothing was mutated.
    SuppressedByGuard,
    /// Dry run: the plan that would have been executed.
    DryRun(Vec<MutationStep>),
}

/// Reconcile the remote subscriber record toward the intent.
///
/// # Errors
///
/// Returns [`ReconcileError::Subscriber`] when the subscriber can neither
/// be found nor created; per-step remote failures do not error, they are
/// recorded in the returned report.
pub async fn reconcile<D>(
    directory: &D,
    intent: &ReconciliationIntent,
    opts: &ReconcileOptions,
) -> Result<ReconcileOutcome, ReconcileError>
where
    D: Directory + ?Sized,
{
    let steps = plan(intent, opts.tags_enabled);

    if opts.dry_run {
        debug!(email = %intent.email, steps = steps.len(), "dry run, skipping remote calls");
        return Ok(ReconcileOutcome::DryRun(steps));
    }

    if let Some(group_name) = &intent.guard_group {
        if already_member(directory, intent.email.as_str(), group_name).await {
            return Ok(ReconcileOutcome::SuppressedByGuard);
        }
    }

    let (subscriber, created) = resolve_or_create(directory, intent).await?;

    let mut reports = Vec::with_capacity(steps.len());
    for step in steps {
        let status = execute_step(directory, &subscriber.id, &step).await;
        match &status {
            StepStatus::Applied => {}
            StepStatus::SkippedMissing => {
                debug!(step = %step, "target absent remotely, step skipped");
            }
            StepStatus::Failed(reason) => {
                warn!(step = %step, reason = %reason, "mutation step failed, continuing");
            }
        }
        reports.push(StepReport { step, status });
    }

    Ok(ReconcileOutcome::Applied(ReconcileReport {
        subscriber_id: subscriber.id,
        created,
        steps: reports,
    }))
}

/// Whether the subscriber is already a member of the named group.
///
/// The abandoned-cart guard: an approved order and a stale abandoned-cart
/// event can race, and once the customer converted, re-flagging them as a
/// lead is an observable state change in the remote directory. Read
/// failures fall through to "not a member" so a lookup outage cannot
/// silently drop leads.
async fn already_member<D>(directory: &D, email: &str, group_name: &str) -> bool
where
    D: Directory + ?Sized,
{
    let group = match directory.find_group_by_name(group_name).await {
        Ok(Some(group)) => group,
        Ok(None) => return false,
        Err(e) => {
            warn!(group = %group_name, error = %e, "guard group lookup failed, proceeding");
            return false;
        }
    };

    match directory.subscriber_with_groups(email).await {
        Ok(Some(subscriber)) => subscriber.groups.iter().any(|g| g.id == group.id),
        Ok(None) => false,
        Err(e) => {
            warn!(email = %email, error = %e, "guard membership lookup failed, proceeding");
            false
        }
    }
}

/// Look the subscriber up by email, creating the record if absent.
///
/// A failed lookup falls through to creation (the remote upserts by
/// email), so only a failed creation aborts.
async fn resolve_or_create<D>(
    directory: &D,
    intent: &ReconciliationIntent,
) -> Result<(Subscriber, bool), ReconcileError>
where
    D: Directory + ?Sized,
{
    let email = intent.email.as_str();

    match directory.find_subscriber(email).await {
        Ok(Some(subscriber)) => return Ok((subscriber, false)),
        Ok(None) => {}
        Err(e) => {
            warn!(email = %email, error = %e, "subscriber lookup failed, attempting creation");
        }
    }

    directory
        .create_subscriber(email, intent.name.as_deref())
        .await
        .map(|subscriber| (subscriber, true))
        .map_err(|source| ReconcileError::Subscriber {
            email: email.to_string(),
            source,
        })
}

/// Execute one mutation step against the directory.
async fn execute_step<D>(directory: &D, subscriber_id: &str, step: &MutationStep) -> StepStatus
where
    D: Directory + ?Sized,
{
    let result = match step {
        MutationStep::AddToGroup(name) => match directory.find_group_by_name(name).await {
            Ok(Some(group)) => directory.assign_to_group(&group.id, subscriber_id).await,
            Ok(None) => return StepStatus::SkippedMissing,
            Err(e) => Err(e),
        },
        MutationStep::RemoveFromGroup(name) => match directory.find_group_by_name(name).await {
            Ok(Some(group)) => {
                directory
                    .unassign_from_group(subscriber_id, &group.id)
                    .await
            }
            Ok(None) => return StepStatus::SkippedMissing,
            Err(e) => Err(e),
        },
        MutationStep::AttachTag(name) => directory.attach_tag(name, subscriber_id).await,
        MutationStep::DetachTag(name) => match directory.list_tags().await {
            Ok(tags) => match tags.into_iter().find(|tag| tag.name == *name) {
                Some(tag) => directory.detach_tag(&tag.id, subscriber_id).await,
                None => return StepStatus::SkippedMissing,
            },
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(()) => StepStatus::Applied,
        Err(e) => StepStatus::Failed(e.to_string()),
    }
}
