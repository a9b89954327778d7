use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    clamp_limit, matching::participant_match, notify, require_profile, Campus, ServiceError,
    ServiceResult,
};
use crate::{
    storage::{
        models::{Message, MessageCursor},
        ChatStore, CommunityStore, Storage, StorageTx,
    },
    types::{NotificationKind, ReputationAction},
};

pub const MAX_MESSAGE_CHARS: usize = 2000;
const DEFAULT_PAGE: u32 = 50;
const MAX_PAGE: u32 = 200;
const PREVIEW_CHARS: usize = 80;

/// One page of a conversation, newest first. `next_before` is the cursor for
/// the following page, absent once the history is exhausted.
#[derive(Clone, Debug)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub next_before: Option<MessageCursor>,
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    let mut out: String = content.chars().take(PREVIEW_CHARS).collect();
    out.push('…');
    out
}

impl<S: Storage> Campus<S> {
    pub fn send_message(
        &self,
        match_id: Uuid,
        sender: Uuid,
        content: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ServiceError::invalid("message content is required"));
        }
        if content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ServiceError::invalid(format!(
                "message must be at most {MAX_MESSAGE_CHARS} characters"
            )));
        }

        let tx = self.storage.begin_tx()?;
        let m = participant_match(&tx, match_id, sender)?;
        let Some(recipient) = m.other(sender) else {
            return Err(ServiceError::forbidden("not a participant of this match"));
        };
        if tx.is_blocked_pair(sender, recipient)? {
            return Err(ServiceError::forbidden("user is blocked"));
        }
        let author = require_profile(&tx, sender)?;

        let message = Message {
            id: Uuid::new_v4(),
            match_id,
            sender_id: sender,
            content: content.to_string(),
            read_at: None,
            created_at: now,
        };
        tx.insert_message(&message)?;
        notify(
            &tx,
            recipient,
            NotificationKind::Message,
            Some(sender),
            Some(match_id),
            format!("@{}: {}", author.username, preview(content)),
            now,
        )?;
        self.policy
            .grant(&tx, recipient, ReputationAction::MessageReceived, now)?;
        tx.commit()?;

        log::debug!("✉️ message {} in match {}", message.id, match_id);
        Ok(message)
    }

    pub fn messages(
        &self,
        match_id: Uuid,
        user: Uuid,
        before: Option<MessageCursor>,
        limit: Option<u32>,
    ) -> ServiceResult<MessagePage> {
        let limit = clamp_limit(limit, DEFAULT_PAGE, MAX_PAGE);
        let tx = self.storage.begin_read()?;
        participant_match(&tx, match_id, user)?;
        let messages = tx.list_messages(match_id, before, limit)?;
        let next_before = if messages.len() as u32 == limit {
            messages.last().map(|m| MessageCursor {
                created_at: m.created_at,
                id: Some(m.id),
            })
        } else {
            None
        };
        Ok(MessagePage {
            messages,
            next_before,
        })
    }

    /// Marks every message the other participant sent as read.
    pub fn mark_read(&self, match_id: Uuid, user: Uuid, now: DateTime<Utc>) -> ServiceResult<usize> {
        let tx = self.storage.begin_tx()?;
        participant_match(&tx, match_id, user)?;
        let updated = tx.mark_messages_read(match_id, user, now)?;
        tx.commit()?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::*;
    use crate::storage::{models::Block, NotificationStore};
    use crate::types::SwipeDirection;
    use chrono::Duration;

    fn matched_pair(
        campus: &Campus<crate::storage::SqliteStorage>,
        a: Uuid,
        b: Uuid,
    ) -> Uuid {
        campus.swipe(a, b, SwipeDirection::Like, at(8, 0)).unwrap();
        campus
            .swipe(b, a, SwipeDirection::Like, at(8, 1))
            .unwrap()
            .match_id
            .unwrap()
    }

    #[test]
    fn send_message_notifies_and_rewards_recipient() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "alice", &[]);
        let b = seed_profile(&storage, "bob", &[]);
        let campus = campus(storage.clone());
        let match_id = matched_pair(&campus, a.id, b.id);

        let sent = campus
            .send_message(match_id, a.id, "  hello there  ", at(10, 0))
            .unwrap();
        assert_eq!(sent.content, "hello there");

        // 5 for the match, 1 for the message
        assert_eq!(campus.get_profile(b.id).unwrap().reputation, 6);
        assert_eq!(campus.get_profile(a.id).unwrap().reputation, 5);

        let read = storage.begin_read().unwrap();
        let notes = read.list_notifications(b.id, true, 10).unwrap();
        assert_eq!(notes[0].kind, NotificationKind::Message);
        assert_eq!(notes[0].body, "@alice: hello there");
    }

    #[test]
    fn send_message_rejects_bad_content_and_outsiders() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "alice", &[]);
        let b = seed_profile(&storage, "bob", &[]);
        let eve = seed_profile(&storage, "eve", &[]);
        let campus = campus(storage);
        let match_id = matched_pair(&campus, a.id, b.id);

        let err = campus.send_message(match_id, a.id, "   ", at(10, 0)).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        let err = campus.send_message(match_id, a.id, &long, at(10, 0)).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = campus.send_message(match_id, eve.id, "hi", at(10, 0)).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = campus
            .send_message(Uuid::new_v4(), a.id, "hi", at(10, 0))
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("match")));
    }

    #[test]
    fn blocked_users_cannot_message() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "alice", &[]);
        let b = seed_profile(&storage, "bob", &[]);
        let campus = campus(storage.clone());
        let match_id = matched_pair(&campus, a.id, b.id);

        let tx = storage.begin_tx().unwrap();
        tx.insert_block(&Block {
            blocker_id: b.id,
            blocked_id: a.id,
            created_at: at(9, 0),
        })
        .unwrap();
        tx.commit().unwrap();

        let err = campus.send_message(match_id, a.id, "hi", at(10, 0)).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[test]
    fn history_pages_and_read_marks() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "alice", &[]);
        let b = seed_profile(&storage, "bob", &[]);
        let campus = campus(storage);
        let match_id = matched_pair(&campus, a.id, b.id);

        for i in 0..5 {
            campus
                .send_message(match_id, a.id, &format!("msg {i}"), at(10, 0) + Duration::minutes(i))
                .unwrap();
        }

        let first = campus.messages(match_id, b.id, None, Some(3)).unwrap();
        assert_eq!(first.messages.len(), 3);
        assert_eq!(first.messages[0].content, "msg 4");
        let cursor = first.next_before.unwrap();

        let second = campus.messages(match_id, b.id, Some(cursor), Some(3)).unwrap();
        assert_eq!(second.messages.len(), 2);
        assert_eq!(second.messages[1].content, "msg 0");
        assert!(second.next_before.is_none());

        let err = campus.messages(match_id, Uuid::new_v4(), None, None).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        assert_eq!(campus.list_matches(b.id).unwrap()[0].unread, 5);
        assert_eq!(campus.mark_read(match_id, a.id, at(11, 0)).unwrap(), 0);
        assert_eq!(campus.mark_read(match_id, b.id, at(11, 0)).unwrap(), 5);
        assert_eq!(campus.list_matches(b.id).unwrap()[0].unread, 0);

        let stamp = at(12, 0);
        for text in ["same 1", "same 2"] {
            campus.send_message(match_id, b.id, text, stamp).unwrap();
        }
        let newest = campus.messages(match_id, a.id, None, Some(1)).unwrap();
        assert_eq!(newest.messages[0].content, "same 2");
        let next = campus
            .messages(match_id, a.id, newest.next_before, Some(1))
            .unwrap();
        assert_eq!(next.messages[0].content, "same 1");
    }

    #[test]
    fn preview_truncates_long_messages() {
        let long = "a".repeat(100);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 1);
        assert!(p.ends_with('…'));
        assert_eq!(preview("short"), "short");
    }
}
