use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{notify, require_profile, validate, Campus, ServiceError, ServiceResult};
use crate::{
    storage::{
        models::{Block, Profile, Report, Star},
        CommunityStore, ProfileStore, Storage, StorageTx,
    },
    types::{NotificationKind, ReportReason, ReputationAction},
};

const MAX_REPORT_DETAILS: usize = 1000;

#[derive(Clone, Debug)]
pub struct NewReport {
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub reason: ReportReason,
    pub details: Option<String>,
}

impl<S: Storage> Campus<S> {
    pub fn give_star(&self, giver: Uuid, receiver: Uuid, now: DateTime<Utc>) -> ServiceResult<Star> {
        if giver == receiver {
            return Err(ServiceError::invalid("cannot star yourself"));
        }
        let tx = self.storage.begin_tx()?;
        let from = require_profile(&tx, giver)?;
        require_profile(&tx, receiver)?;
        if tx.load_star(giver, receiver)?.is_some() {
            return Err(ServiceError::conflict("already starred this user"));
        }

        let star = Star {
            giver_id: giver,
            receiver_id: receiver,
            created_at: now,
        };
        tx.insert_star(&star)?;
        notify(
            &tx,
            receiver,
            NotificationKind::Star,
            Some(giver),
            None,
            format!("@{} gave you a star", from.username),
            now,
        )?;
        self.policy
            .grant(&tx, receiver, ReputationAction::StarReceived, now)?;
        tx.commit()?;
        Ok(star)
    }

    /// Points already granted for the star are kept.
    pub fn remove_star(&self, giver: Uuid, receiver: Uuid) -> ServiceResult<()> {
        let tx = self.storage.begin_tx()?;
        if tx.delete_star(giver, receiver)? == 0 {
            return Err(ServiceError::NotFound("star"));
        }
        tx.commit()?;
        Ok(())
    }

    pub fn block(&self, blocker: Uuid, blocked: Uuid, now: DateTime<Utc>) -> ServiceResult<Block> {
        if blocker == blocked {
            return Err(ServiceError::invalid("cannot block yourself"));
        }
        let tx = self.storage.begin_tx()?;
        require_profile(&tx, blocker)?;
        require_profile(&tx, blocked)?;
        if tx.load_block(blocker, blocked)?.is_some() {
            return Err(ServiceError::conflict("user is already blocked"));
        }
        let block = Block {
            blocker_id: blocker,
            blocked_id: blocked,
            created_at: now,
        };
        tx.insert_block(&block)?;
        tx.commit()?;
        log::info!("🚫 {} blocked {}", blocker, blocked);
        Ok(block)
    }

    pub fn unblock(&self, blocker: Uuid, blocked: Uuid) -> ServiceResult<()> {
        let tx = self.storage.begin_tx()?;
        if tx.delete_block(blocker, blocked)? == 0 {
            return Err(ServiceError::NotFound("block"));
        }
        tx.commit()?;
        Ok(())
    }

    pub fn blocked_profiles(&self, user: Uuid) -> ServiceResult<Vec<Profile>> {
        let tx = self.storage.begin_read()?;
        require_profile(&tx, user)?;
        let mut out = Vec::new();
        for block in tx.list_blocked_by(user)? {
            if let Some(profile) = tx.load_profile(block.blocked_id)? {
                out.push(profile);
            }
        }
        Ok(out)
    }

    pub fn report(&self, new: NewReport, now: DateTime<Utc>) -> ServiceResult<Report> {
        if new.reporter_id == new.reported_id {
            return Err(ServiceError::invalid("cannot report yourself"));
        }
        let report = Report {
            id: Uuid::new_v4(),
            reporter_id: new.reporter_id,
            reported_id: new.reported_id,
            reason: new.reason,
            details: validate::optional_text(
                "details",
                new.details.as_deref(),
                MAX_REPORT_DETAILS,
            )?,
            created_at: now,
        };

        let tx = self.storage.begin_tx()?;
        require_profile(&tx, report.reporter_id)?;
        require_profile(&tx, report.reported_id)?;
        tx.insert_report(&report)?;
        tx.commit()?;
        log::warn!(
            "⚠️ report {} against {}: {}",
            report.id,
            report.reported_id,
            report.reason
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::*;

    #[test]
    fn stars_reward_once_and_survive_removal() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "alice", &[]);
        let b = seed_profile(&storage, "bob", &[]);
        let campus = campus(storage);

        campus.give_star(a.id, b.id, at(10, 0)).unwrap();
        let err = campus.give_star(a.id, b.id, at(10, 1)).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        let err = campus.give_star(a.id, a.id, at(10, 1)).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(campus.get_profile(b.id).unwrap().reputation, 3);

        campus.remove_star(a.id, b.id).unwrap();
        assert_eq!(campus.get_profile(b.id).unwrap().reputation, 3);
        let err = campus.remove_star(a.id, b.id).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("star")));
    }

    #[test]
    fn block_hides_from_discover_until_unblocked() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "alice", &[]);
        let b = seed_profile(&storage, "bob", &[]);
        let campus = campus(storage);

        campus.block(b.id, a.id, at(10, 0)).unwrap();
        let err = campus.block(b.id, a.id, at(10, 1)).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert!(campus.discover(a.id, None).unwrap().is_empty());

        let blocked = campus.blocked_profiles(b.id).unwrap();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].id, a.id);

        campus.unblock(b.id, a.id).unwrap();
        assert_eq!(campus.discover(a.id, None).unwrap().len(), 1);
        let err = campus.unblock(b.id, a.id).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("block")));
    }

    #[test]
    fn reports_validate_parties() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "alice", &[]);
        let b = seed_profile(&storage, "bob", &[]);
        let campus = campus(storage);

        let report = campus
            .report(
                NewReport {
                    reporter_id: a.id,
                    reported_id: b.id,
                    reason: ReportReason::Spam,
                    details: Some("  sends links  ".into()),
                },
                at(10, 0),
            )
            .unwrap();
        assert_eq!(report.details.as_deref(), Some("sends links"));

        let err = campus
            .report(
                NewReport {
                    reporter_id: a.id,
                    reported_id: a.id,
                    reason: ReportReason::Other,
                    details: None,
                },
                at(10, 0),
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
