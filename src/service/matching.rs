use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{notify, require_profile, Campus, ServiceError, ServiceResult};
use crate::{
    storage::{
        models::{Match, Message, Profile, Swipe},
        ChatStore, CommunityStore, MatchStore, Storage, StorageTx,
    },
    types::{NotificationKind, ReputationAction, SwipeDirection},
};

#[derive(Clone, Debug, PartialEq)]
pub struct SwipeOutcome {
    pub swipe_id: Uuid,
    pub matched: bool,
    pub match_id: Option<Uuid>,
}

#[derive(Clone, Debug)]
pub struct MatchOverview {
    pub match_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub other: Profile,
    pub last_message: Option<Message>,
    pub unread: i64,
}

impl MatchOverview {
    fn last_activity(&self) -> DateTime<Utc> {
        self.last_message
            .as_ref()
            .map(|m| m.created_at)
            .unwrap_or(self.created_at)
    }
}

impl<S: Storage> Campus<S> {
    pub fn swipe(
        &self,
        swiper: Uuid,
        target: Uuid,
        direction: SwipeDirection,
        now: DateTime<Utc>,
    ) -> ServiceResult<SwipeOutcome> {
        if swiper == target {
            return Err(ServiceError::invalid("cannot swipe on yourself"));
        }

        let tx = self.storage.begin_tx()?;
        let swiper_profile = require_profile(&tx, swiper)?;
        let target_profile = require_profile(&tx, target)?;
        if tx.is_blocked_pair(swiper, target)? {
            return Err(ServiceError::forbidden("user is blocked"));
        }
        if tx.load_swipe(swiper, target)?.is_some() {
            return Err(ServiceError::conflict("already swiped on this user"));
        }

        let swipe = Swipe {
            id: Uuid::new_v4(),
            swiper_id: swiper,
            target_id: target,
            direction,
            created_at: now,
        };
        tx.insert_swipe(&swipe)?;

        let mutual = direction == SwipeDirection::Like
            && tx
                .load_swipe(target, swiper)?
                .is_some_and(|back| back.direction == SwipeDirection::Like);

        let mut match_id = None;
        if mutual && tx.find_match_between(swiper, target)?.is_none() {
            let m = Match::between(Uuid::new_v4(), swiper, target, now);
            tx.insert_match(&m)?;
            for (user, other) in [(&swiper_profile, &target_profile), (&target_profile, &swiper_profile)] {
                notify(
                    &tx,
                    user.id,
                    NotificationKind::Match,
                    Some(other.id),
                    Some(m.id),
                    format!("You matched with @{}", other.username),
                    now,
                )?;
                self.policy
                    .grant(&tx, user.id, ReputationAction::Matched, now)?;
            }
            log::info!("💞 match {} between {} and {}", m.id, swiper, target);
            match_id = Some(m.id);
        }

        tx.commit()?;
        Ok(SwipeOutcome {
            swipe_id: swipe.id,
            matched: match_id.is_some(),
            match_id,
        })
    }

    pub fn list_matches(&self, user: Uuid) -> ServiceResult<Vec<MatchOverview>> {
        let tx = self.storage.begin_read()?;
        require_profile(&tx, user)?;

        let mut out = Vec::new();
        for m in tx.list_matches_for(user)? {
            let Some(other_id) = m.other(user) else {
                continue;
            };
            let other = require_profile(&tx, other_id)?;
            out.push(MatchOverview {
                match_id: m.id,
                created_at: m.created_at,
                other,
                last_message: tx.last_message(m.id)?,
                unread: tx.count_unread_in_match(m.id, user)?,
            });
        }
        out.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
        Ok(out)
    }

    pub fn unmatch(&self, match_id: Uuid, user: Uuid) -> ServiceResult<()> {
        let tx = self.storage.begin_tx()?;
        participant_match(&tx, match_id, user)?;
        tx.delete_match(match_id)?;
        tx.commit()?;
        log::info!("💔 match {} removed by {}", match_id, user);
        Ok(())
    }
}

/// Loads a match and checks that `user` is part of it.
pub(super) fn participant_match<T: StorageTx>(
    tx: &T,
    match_id: Uuid,
    user: Uuid,
) -> ServiceResult<Match> {
    let m = tx
        .load_match(match_id)?
        .ok_or(ServiceError::NotFound("match"))?;
    if !m.involves(user) {
        return Err(ServiceError::forbidden("not a participant of this match"));
    }
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::*;
    use crate::storage::{models::Block, CommunityStore, NotificationStore};

    #[test]
    fn mutual_like_creates_a_match_and_rewards_both() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "alice", &[]);
        let b = seed_profile(&storage, "bob", &[]);
        let campus = campus(storage.clone());

        let first = campus.swipe(a.id, b.id, SwipeDirection::Like, at(10, 0)).unwrap();
        assert!(!first.matched);
        let second = campus.swipe(b.id, a.id, SwipeDirection::Like, at(10, 1)).unwrap();
        assert!(second.matched);
        let match_id = second.match_id.unwrap();

        assert_eq!(campus.get_profile(a.id).unwrap().reputation, 5);
        assert_eq!(campus.get_profile(b.id).unwrap().reputation, 5);

        let read = storage.begin_read().unwrap();
        let notes = read.list_notifications(a.id, false, 10).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Match);
        assert_eq!(notes[0].subject_id, Some(match_id));
        assert_eq!(notes[0].body, "You matched with @bob");
        drop(read);

        let overview = campus.list_matches(a.id).unwrap();
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].other.id, b.id);
        assert_eq!(overview[0].unread, 0);
    }

    #[test]
    fn pass_never_matches() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "alice", &[]);
        let b = seed_profile(&storage, "bob", &[]);
        let campus = campus(storage);

        campus.swipe(a.id, b.id, SwipeDirection::Like, at(10, 0)).unwrap();
        let outcome = campus.swipe(b.id, a.id, SwipeDirection::Pass, at(10, 1)).unwrap();
        assert!(!outcome.matched);
        assert!(campus.list_matches(a.id).unwrap().is_empty());
    }

    #[test]
    fn swipe_rules() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "alice", &[]);
        let b = seed_profile(&storage, "bob", &[]);
        let c = seed_profile(&storage, "carol", &[]);
        let tx = storage.begin_tx().unwrap();
        tx.insert_block(&Block {
            blocker_id: c.id,
            blocked_id: a.id,
            created_at: at(9, 0),
        })
        .unwrap();
        tx.commit().unwrap();
        let campus = campus(storage);

        let err = campus.swipe(a.id, a.id, SwipeDirection::Like, at(10, 0)).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = campus
            .swipe(a.id, Uuid::new_v4(), SwipeDirection::Like, at(10, 0))
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("profile")));

        campus.swipe(a.id, b.id, SwipeDirection::Pass, at(10, 0)).unwrap();
        let err = campus.swipe(a.id, b.id, SwipeDirection::Like, at(10, 1)).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = campus.swipe(a.id, c.id, SwipeDirection::Like, at(10, 2)).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[test]
    fn unmatch_is_participant_only() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "alice", &[]);
        let b = seed_profile(&storage, "bob", &[]);
        let outsider = seed_profile(&storage, "eve", &[]);
        let campus = campus(storage);

        campus.swipe(a.id, b.id, SwipeDirection::Like, at(10, 0)).unwrap();
        let match_id = campus
            .swipe(b.id, a.id, SwipeDirection::Like, at(10, 1))
            .unwrap()
            .match_id
            .unwrap();

        let err = campus.unmatch(match_id, outsider.id).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        campus.unmatch(match_id, b.id).unwrap();
        assert!(campus.list_matches(a.id).unwrap().is_empty());
        let err = campus.unmatch(match_id, b.id).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("match")));
    }
}
