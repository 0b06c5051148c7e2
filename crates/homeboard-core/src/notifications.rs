use homeboard_protocol::{MAX_NOTIFICATIONS, Notification, NotificationList};

use crate::render::{WidgetView, render_notification_list};

/// Client copy of the server's notification list, newest first.
#[derive(Debug, Default, Clone)]
pub struct NotificationCenter {
    list: NotificationList,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt the list from a poll, trimmed to the retention cap.
    pub fn replace_all(&mut self, mut list: NotificationList) {
        list.notifications.truncate(MAX_NOTIFICATIONS);
        self.list = list;
    }

    /// Prepend a pushed notification. A repeat id replaces the older copy.
    pub fn receive(&mut self, notification: Notification) {
        self.list.notifications.retain(|n| n.id != notification.id);
        self.list.notifications.insert(0, notification);
        self.list.notifications.truncate(MAX_NOTIFICATIONS);
    }

    /// Flip the local read flag. Returns false for an unknown id.
    pub fn mark_read_local(&mut self, id: &str) -> bool {
        match self.list.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    pub fn unread_count(&self) -> usize {
        self.list.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.list.notifications
    }

    pub fn view(&self) -> WidgetView {
        render_notification_list(&self.list)
    }
}
