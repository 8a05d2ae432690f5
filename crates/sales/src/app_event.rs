use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfloor_core::{
    AppEventId, BranchOfficeId, DomainError, DomainResult, Entity, OrganizationId, PosSessionId,
    ProductId, ProfileId, check_len,
};

use crate::session::PosSession;

/// Something the cashier ran into that the back office should look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppEventKind {
    NoStock,
    NoPrice,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppEventDraft {
    #[serde(rename = "type")]
    pub kind: AppEventKind,
    #[serde(default)]
    pub pos_session_id: Option<PosSessionId>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEvent {
    pub id: AppEventId,
    pub organization_id: OrganizationId,
    pub profile_id: ProfileId,
    #[serde(rename = "type")]
    pub kind: AppEventKind,
    pub branch_office_id: Option<BranchOfficeId>,
    pub pos_session_id: Option<PosSessionId>,
    pub product_id: Option<ProductId>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AppEvent {
    /// `session` is the one named in the draft, already resolved within the
    /// organization; its branch office is copied onto the event.
    pub fn record(
        organization_id: OrganizationId,
        profile_id: ProfileId,
        draft: AppEventDraft,
        session: Option<&PosSession>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if draft.kind == AppEventKind::NoStock && draft.product_id.is_none() {
            return Err(DomainError::validation("product_id is required for NO_STOCK events"));
        }
        let comments = draft
            .comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if let Some(c) = &comments {
            check_len("comments", c, 2000)?;
        }
        if let (Some(wanted), Some(found)) = (draft.pos_session_id, session) {
            if wanted != found.id || found.organization_id != organization_id {
                return Err(DomainError::invariant("pos session does not belong to the organization"));
            }
        }

        Ok(Self {
            id: AppEventId::new(),
            organization_id,
            profile_id,
            kind: draft.kind,
            branch_office_id: session.map(|s| s.branch_office_id),
            pos_session_id: draft.pos_session_id,
            product_id: draft.product_id,
            comments,
            created_at: now,
        })
    }
}

impl Entity for AppEvent {
    type Id = AppEventId;

    fn id(&self) -> AppEventId {
        self.id
    }

    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(kind: AppEventKind, product: Option<ProductId>) -> AppEventDraft {
        AppEventDraft {
            kind,
            pos_session_id: None,
            product_id: product,
            comments: Some("  sin existencias en mostrador ".to_string()),
        }
    }

    #[test]
    fn no_stock_requires_a_product() {
        let err = AppEvent::record(
            OrganizationId::new(),
            ProfileId::new(),
            draft(AppEventKind::NoStock, None),
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn other_events_need_nothing_and_trim_comments() {
        let ev = AppEvent::record(
            OrganizationId::new(),
            ProfileId::new(),
            draft(AppEventKind::Other, None),
            None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(ev.comments.as_deref(), Some("sin existencias en mostrador"));
        assert_eq!(ev.branch_office_id, None);
    }

    #[test]
    fn session_branch_is_copied() {
        let org = OrganizationId::new();
        let seller = ProfileId::new();
        let session = PosSession::open(org, BranchOfficeId::new(), seller, Utc::now());
        let mut d = draft(AppEventKind::NoPrice, Some(ProductId::new()));
        d.pos_session_id = Some(session.id);

        let ev = AppEvent::record(org, seller, d, Some(&session), Utc::now()).unwrap();
        assert_eq!(ev.branch_office_id, Some(session.branch_office_id));
    }

    #[test]
    fn kind_serializes_screaming_snake() {
        let json = serde_json::to_value(AppEventKind::NoStock).unwrap();
        assert_eq!(json, serde_json::json!("NO_STOCK"));
    }
}
