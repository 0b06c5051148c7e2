//! User intents: post to the server, then reconcile the affected widgets.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use homeboard_protocol::Action;
use tracing::{debug, info, warn};

use crate::api::DashboardApi;
use crate::board::WidgetBoard;
use crate::notifications::NotificationCenter;
use crate::scheduler::PollScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Input failed validation; nothing was sent.
    Rejected,
    Sent,
    /// The request failed. The affected domains were still refreshed.
    Failed,
}

pub struct ActionClient {
    api: Arc<dyn DashboardApi>,
    scheduler: Arc<PollScheduler>,
    center: Arc<Mutex<NotificationCenter>>,
    board: Arc<WidgetBoard>,
    reconcile_delay: Duration,
}

impl ActionClient {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        scheduler: Arc<PollScheduler>,
        center: Arc<Mutex<NotificationCenter>>,
        board: Arc<WidgetBoard>,
        reconcile_delay: Duration,
    ) -> Self {
        Self {
            api,
            scheduler,
            center,
            board,
            reconcile_delay,
        }
    }

    /// Send `action` and refresh its domains once the reconcile delay has
    /// passed. Resolves after the refreshes have run.
    pub async fn perform(&self, action: Action) -> ActionOutcome {
        if let Err(e) = action.validate() {
            debug!(
                event = "core.actions.rejected",
                action = action.name(),
                error = %e,
            );
            return ActionOutcome::Rejected;
        }

        let outcome = match self.api.post(&action).await {
            Ok(_) => {
                info!(event = "core.actions.sent", action = action.name());
                ActionOutcome::Sent
            }
            Err(e) => {
                warn!(
                    event = "core.actions.failed",
                    action = action.name(),
                    error = %e,
                    error_code = e.error_code(),
                );
                ActionOutcome::Failed
            }
        };

        // Optimistic either way; the reconcile poll restores the server's view.
        if let Action::MarkNotificationRead { id } = &action {
            self.mark_read(id);
        }

        tokio::time::sleep(self.reconcile_delay).await;
        for &domain in action.reconcile_domains() {
            match self.scheduler.refresh_now(domain).await {
                Ok(run) => debug!(
                    event = "core.actions.reconciled",
                    domain = %domain,
                    outcome = ?run,
                ),
                Err(e) => warn!(
                    event = "core.actions.reconcile_failed",
                    domain = %domain,
                    error = %e,
                ),
            }
        }
        outcome
    }

    fn mark_read(&self, id: &str) {
        let view = {
            let mut center = self.center.lock().unwrap_or_else(|e| e.into_inner());
            if !center.mark_read_local(id) {
                return;
            }
            center.view()
        };
        self.board.apply(view);
    }
}
