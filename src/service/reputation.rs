use chrono::{DateTime, NaiveTime, Utc};
use uuid::Uuid;

use super::{require_profile, Campus, ServiceResult};
use crate::{
    storage::{models::ReputationEvent, ReputationStore, Storage, StorageTx},
    types::ReputationAction,
};

pub const DEFAULT_DAILY_CAP: i64 = 50;
const SUMMARY_EVENTS: u32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReputationPolicy {
    pub daily_cap: i64,
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self {
            daily_cap: DEFAULT_DAILY_CAP,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReputationSummary {
    pub reputation: i64,
    pub today_points: i64,
    pub daily_cap: i64,
    pub events: Vec<ReputationEvent>,
}

pub fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

impl ReputationPolicy {
    /// Records `action` for `user` inside the caller's transaction and returns
    /// the points actually granted. The caller must hold the write lock so
    /// the cap check and the increment cannot interleave with another award.
    pub fn grant<T: ReputationStore + ?Sized>(
        &self,
        tx: &T,
        user: Uuid,
        action: ReputationAction,
        now: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        let points = if action.is_one_time() {
            if tx.has_reputation_event(user, action)? {
                0
            } else {
                action.points()
            }
        } else {
            let earned = tx.sum_capped_points_since(user, day_start(now))?;
            action.points().min((self.daily_cap - earned).max(0))
        };

        if points == 0 {
            log::debug!("reputation {} for {} granted nothing", action, user);
            return Ok(0);
        }

        tx.insert_reputation_event(&ReputationEvent {
            user_id: user,
            action,
            points,
            created_at: now,
        })?;
        tx.add_reputation(user, points)?;
        log::debug!("reputation {} for {}: +{}", action, user, points);
        Ok(points)
    }
}

impl<S: Storage> Campus<S> {
    pub fn award(
        &self,
        user: Uuid,
        action: ReputationAction,
        now: DateTime<Utc>,
    ) -> ServiceResult<i64> {
        let tx = self.storage.begin_tx()?;
        require_profile(&tx, user)?;
        let granted = self.policy.grant(&tx, user, action, now)?;
        tx.commit()?;
        Ok(granted)
    }

    pub fn reputation_summary(
        &self,
        user: Uuid,
        now: DateTime<Utc>,
    ) -> ServiceResult<ReputationSummary> {
        let tx = self.storage.begin_read()?;
        let profile = require_profile(&tx, user)?;
        Ok(ReputationSummary {
            reputation: profile.reputation,
            today_points: tx.sum_capped_points_since(user, day_start(now))?,
            daily_cap: self.policy.daily_cap,
            events: tx.list_reputation_events(user, SUMMARY_EVENTS)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::*;
    use crate::service::ServiceError;
    use chrono::TimeZone;

    #[test]
    fn day_start_truncates_to_midnight_utc() {
        let now = Utc.with_ymd_and_hms(2024, 3, 14, 17, 45, 12).unwrap();
        assert_eq!(
            day_start(now),
            Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn daily_cap_clips_the_last_award() {
        let (_dir, storage) = temp_storage();
        let user = seed_profile(&storage, "busy", &[]);
        let campus = campus(storage);

        let mut total = 0;
        for _ in 0..5 {
            total += campus
                .award(user.id, ReputationAction::JoinedTeam, at(10, 0))
                .unwrap();
        }
        assert_eq!(total, 50);
        let clipped = campus
            .award(user.id, ReputationAction::Matched, at(10, 5))
            .unwrap();
        assert_eq!(clipped, 0);

        let summary = campus.reputation_summary(user.id, at(18, 0)).unwrap();
        assert_eq!(summary.reputation, 50);
        assert_eq!(summary.today_points, 50);
        assert_eq!(summary.events.len(), 5);
    }

    #[test]
    fn partial_allowance_is_granted() {
        let (_dir, storage) = temp_storage();
        let user = seed_profile(&storage, "near_cap", &[]);
        let campus = campus(storage);

        for _ in 0..4 {
            campus
                .award(user.id, ReputationAction::JoinedTeam, at(9, 0))
                .unwrap();
        }
        for _ in 0..3 {
            campus
                .award(user.id, ReputationAction::StarReceived, at(9, 30))
                .unwrap();
        }
        let granted = campus
            .award(user.id, ReputationAction::Matched, at(9, 45))
            .unwrap();
        assert_eq!(granted, 1);
    }

    #[test]
    fn cap_resets_on_the_next_day() {
        let (_dir, storage) = temp_storage();
        let user = seed_profile(&storage, "daily", &[]);
        let campus = campus(storage);

        for _ in 0..5 {
            campus
                .award(user.id, ReputationAction::JoinedTeam, at(23, 0))
                .unwrap();
        }
        let tomorrow = at(23, 0) + chrono::Duration::hours(2);
        let granted = campus
            .award(user.id, ReputationAction::Matched, tomorrow)
            .unwrap();
        assert_eq!(granted, 5);
    }

    #[test]
    fn one_time_actions_pay_once_and_ignore_cap() {
        let (_dir, storage) = temp_storage();
        let user = seed_profile(&storage, "linker", &[]);
        let campus = campus(storage);

        for _ in 0..5 {
            campus
                .award(user.id, ReputationAction::JoinedTeam, at(10, 0))
                .unwrap();
        }
        assert_eq!(
            campus
                .award(user.id, ReputationAction::LinkGithub, at(10, 1))
                .unwrap(),
            20
        );
        assert_eq!(
            campus
                .award(user.id, ReputationAction::LinkGithub, at(10, 2))
                .unwrap(),
            0
        );
        let summary = campus.reputation_summary(user.id, at(10, 3)).unwrap();
        assert_eq!(summary.reputation, 70);
        assert_eq!(summary.today_points, 50);
    }

    #[test]
    fn award_to_unknown_profile_is_not_found() {
        let (_dir, storage) = temp_storage();
        let campus = campus(storage);
        let err = campus
            .award(Uuid::new_v4(), ReputationAction::Matched, at(10, 0))
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("profile")));
    }

    #[test]
    fn concurrent_awards_do_not_lose_increments() {
        let (_dir, storage) = temp_storage();
        let user_id = seed_profile(&storage, "popular", &[]).id;
        let campus = campus(storage);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let campus = campus.clone();
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        loop {
                            match campus.award(user_id, ReputationAction::MessageReceived, at(12, 0)) {
                                Ok(_) => break,
                                Err(ServiceError::Storage(_)) => {
                                    std::thread::sleep(std::time::Duration::from_millis(5))
                                }
                                Err(other) => panic!("unexpected error: {other}"),
                            }
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let summary = campus.reputation_summary(user_id, at(12, 30)).unwrap();
        assert_eq!(summary.reputation, 40);
        assert_eq!(summary.today_points, 40);
    }
}
