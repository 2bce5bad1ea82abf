use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::NotificationWithSender;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderRef {
    pub id: Uuid,
    pub username: String,
    pub profile_img: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub kind: String,
    pub post_id: Option<Uuid>,
    pub read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// `None` when the sender's account no longer exists.
    pub from: Option<SenderRef>,
}

impl From<NotificationWithSender> for NotificationResponse {
    fn from(n: NotificationWithSender) -> Self {
        let from = n.from_username.map(|username| SenderRef {
            id: n.from_user,
            username,
            profile_img: n.from_profile_img.unwrap_or_default(),
        });
        Self {
            id: n.id,
            kind: n.kind,
            post_id: n.post_id,
            read: n.read,
            created_at: n.created_at,
            from,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn row(username: Option<&str>) -> NotificationWithSender {
        NotificationWithSender {
            id: Uuid::new_v4(),
            from_user: Uuid::new_v4(),
            kind: "follow".into(),
            post_id: None,
            read: false,
            created_at: datetime!(2024-01-01 00:00 UTC),
            from_username: username.map(Into::into),
            from_profile_img: username.map(|_| "".into()),
        }
    }

    #[test]
    fn resolves_sender_when_present() {
        let resp = NotificationResponse::from(row(Some("alice")));
        assert_eq!(resp.from.unwrap().username, "alice");
        assert_eq!(resp.kind, "follow");
        assert!(!resp.read);
    }

    #[test]
    fn sender_is_none_for_deleted_accounts() {
        let resp = NotificationResponse::from(row(None));
        assert!(resp.from.is_none());
    }
}
