use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfloor_core::{
    BranchOfficeId, DomainError, DomainResult, Entity, OrganizationId, PosSessionId, ProfileId,
    check_len,
};

use crate::sale::Sale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Started,
    Closed,
}

/// A seller's shift at a branch office. Sales are recorded against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosSession {
    pub id: PosSessionId,
    pub organization_id: OrganizationId,
    pub branch_office_id: BranchOfficeId,
    pub seller_id: ProfileId,
    pub status: SessionStatus,
    pub total_qty: i64,
    pub total_amount: i64,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenSession {
    pub branch_office_id: BranchOfficeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionUpdate {
    pub status: SessionStatus,
    #[serde(default)]
    pub comments: Option<String>,
}

impl PosSession {
    pub fn open(
        organization_id: OrganizationId,
        branch_office_id: BranchOfficeId,
        seller_id: ProfileId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PosSessionId::new(),
            organization_id,
            branch_office_id,
            seller_id,
            status: SessionStatus::Started,
            total_qty: 0,
            total_amount: 0,
            comments: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.status == SessionStatus::Started
    }

    /// Change status and comments. Closing stamps `closed_at`; a closed
    /// session stays closed.
    pub fn update(&mut self, update: SessionUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(comments) = &update.comments {
            check_len("comments", comments, 2000)?;
        }
        match (self.status, update.status) {
            (SessionStatus::Closed, SessionStatus::Started) => {
                return Err(DomainError::invariant("a closed session cannot be reopened"));
            }
            (SessionStatus::Started, SessionStatus::Closed) => {
                self.closed_at = Some(now);
            }
            _ => {}
        }
        self.status = update.status;
        if update.comments.is_some() {
            self.comments = update.comments;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Recompute the running totals from the sales recorded in this session.
    pub fn with_totals(mut self, sales: &[Sale]) -> Self {
        let own = sales.iter().filter(|s| s.pos_session_id == self.id);
        let (qty, amount) = own.fold((0i64, 0i64), |(q, a), s| {
            (q.saturating_add(s.total_qty()), a.saturating_add(s.total))
        });
        self.total_qty = qty;
        self.total_amount = amount;
        self
    }
}

impl Entity for PosSession {
    type Id = PosSessionId;

    fn id(&self) -> PosSessionId {
        self.id
    }

    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> PosSession {
        PosSession::open(
            OrganizationId::new(),
            BranchOfficeId::new(),
            ProfileId::new(),
            Utc::now(),
        )
    }

    #[test]
    fn open_session_starts_with_zero_totals() {
        let s = session();
        assert!(s.is_started());
        assert_eq!((s.total_qty, s.total_amount), (0, 0));
        assert_eq!(s.closed_at, None);
    }

    #[test]
    fn closing_stamps_closed_at_and_keeps_comments() {
        let mut s = session();
        s.update(
            SessionUpdate {
                status: SessionStatus::Closed,
                comments: Some("cuadre sin diferencias".to_string()),
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(s.status, SessionStatus::Closed);
        assert!(s.closed_at.is_some());
        assert_eq!(s.comments.as_deref(), Some("cuadre sin diferencias"));
    }

    #[test]
    fn closed_session_cannot_be_reopened() {
        let mut s = session();
        s.update(
            SessionUpdate {
                status: SessionStatus::Closed,
                comments: None,
            },
            Utc::now(),
        )
        .unwrap();

        let err = s
            .update(
                SessionUpdate {
                    status: SessionStatus::Started,
                    comments: None,
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn comment_only_update_keeps_session_started() {
        let mut s = session();
        s.update(
            SessionUpdate {
                status: SessionStatus::Started,
                comments: Some("cambio de caja".to_string()),
            },
            Utc::now(),
        )
        .unwrap();
        assert!(s.is_started());
        assert_eq!(s.closed_at, None);
    }
}
