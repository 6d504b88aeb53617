//! Domain models for the session and the notification inbox

mod notification;
mod session;

pub use notification::{InboxItem, LastSeen, NotificationId};
pub use session::{RecipientId, Session};
