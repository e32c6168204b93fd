use super::{AppContext, ui};
use crate::NotificationCommand;
use crate::core::records::Notification;
use anyhow::Result;
use comfy_table::{Attribute, Cell};

pub fn notifications_table(notifications: &[Notification]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Date"),
        ui::header_cell("Title"),
        ui::header_cell("Message"),
    ]);
    for notification in notifications {
        let mut title = Cell::new(&notification.title);
        if !notification.read {
            title = title.add_attribute(Attribute::Bold);
        }
        table.add_row(vec![
            Cell::new(&notification.id),
            Cell::new(notification.created_at.format("%Y-%m-%d %H:%M")),
            title,
            Cell::new(&notification.message),
        ]);
    }
    table.to_string()
}

pub async fn run(ctx: &AppContext, command: Option<NotificationCommand>) -> Result<()> {
    match command.unwrap_or(NotificationCommand::List { unread: false }) {
        NotificationCommand::List { unread } => {
            let notifications = ctx.api().list_notifications(unread).await?;
            if notifications.is_empty() {
                println!("No notifications.");
                return Ok(());
            }
            let unread_count = notifications.iter().filter(|n| !n.read).count();
            println!("{}", notifications_table(&notifications));
            println!(
                "{}",
                ui::style_text(&format!("{unread_count} unread"), ui::StyleType::Subtle)
            );
        }
        NotificationCommand::Read { id } => {
            ctx.api().mark_notification_read(&id).await?;
            println!("Marked notification {id} as read");
        }
        NotificationCommand::ReadAll => {
            ctx.api().mark_all_notifications_read().await?;
            println!("Marked all notifications as read");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_notifications_table() {
        let notification = Notification {
            id: "n1".to_string(),
            title: "Budget alert".to_string(),
            message: "Dining reached 90%".to_string(),
            kind: "budget".to_string(),
            read: false,
            created_at: Utc.with_ymd_and_hms(2024, 6, 2, 9, 30, 0).unwrap(),
        };
        let output = notifications_table(&[notification]);
        assert!(output.contains("Budget alert"));
        assert!(output.contains("2024-06-02 09:30"));
    }
}
