use shopfloor_catalog::Product;
use shopfloor_sales::{AppEvent, AppEventDraft, PosSession};

use super::{Actor, BackOffice, BackOfficeResult};
use crate::store;

impl BackOffice {
    pub async fn create_app_event(
        &self,
        actor: Actor,
        draft: AppEventDraft,
    ) -> BackOfficeResult<AppEvent> {
        let session = match draft.pos_session_id {
            Some(id) => Some(
                self.find::<PosSession>(actor.organization_id, id, "pos session")
                    .await?,
            ),
            None => None,
        };
        if let Some(product_id) = draft.product_id {
            let _: Product = self
                .referenced(actor.organization_id, product_id, "product")
                .await?;
        }

        let event = AppEvent::record(
            actor.organization_id,
            actor.profile_id,
            draft,
            session.as_ref(),
            self.now(),
        )?;
        store::save(self.store(), &event).await?;
        tracing::info!(
            organization_id = %event.organization_id,
            app_event_id = %event.id,
            kind = ?event.kind,
            "app event recorded"
        );
        Ok(event)
    }

    /// Newest first.
    pub async fn list_app_events(&self, actor: Actor) -> BackOfficeResult<Vec<AppEvent>> {
        let mut events: Vec<AppEvent> = store::load_all(self.store(), actor.organization_id).await?;
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::back_office::BackOfficeError;
    use crate::back_office::inventory::tests::stocked_warehouse;
    use crate::back_office::tests::{actor, back_office};
    use shopfloor_core::PosSessionId;
    use shopfloor_sales::{AppEventKind, OpenSession};

    fn draft(kind: AppEventKind) -> AppEventDraft {
        AppEventDraft {
            kind,
            pos_session_id: None,
            product_id: None,
            comments: None,
        }
    }

    #[tokio::test]
    async fn no_stock_event_carries_session_branch() {
        let bo = back_office();
        let a = actor();
        let (w, p) = stocked_warehouse(&bo, a).await;
        let session = bo
            .open_session(
                a,
                OpenSession {
                    branch_office_id: w.branch_office_id,
                },
            )
            .await
            .unwrap()
            .session;

        let event = bo
            .create_app_event(
                a,
                AppEventDraft {
                    pos_session_id: Some(session.id),
                    product_id: Some(p.id),
                    comments: Some("  cliente pidio 3  ".to_string()),
                    ..draft(AppEventKind::NoStock)
                },
            )
            .await
            .unwrap();
        assert_eq!(event.branch_office_id, Some(w.branch_office_id));
        assert_eq!(event.profile_id, a.profile_id);
        assert_eq!(event.comments.as_deref(), Some("cliente pidio 3"));
    }

    #[tokio::test]
    async fn references_are_checked() {
        let bo = back_office();
        let a = actor();

        assert!(matches!(
            bo.create_app_event(a, draft(AppEventKind::NoStock)).await,
            Err(BackOfficeError::Validation(_))
        ));
        assert!(matches!(
            bo.create_app_event(
                a,
                AppEventDraft {
                    pos_session_id: Some(PosSessionId::new()),
                    ..draft(AppEventKind::Other)
                }
            )
            .await,
            Err(BackOfficeError::NotFound(_))
        ));

        let (_, foreign) = stocked_warehouse(&bo, actor()).await;
        assert!(matches!(
            bo.create_app_event(
                a,
                AppEventDraft {
                    product_id: Some(foreign.id),
                    ..draft(AppEventKind::NoPrice)
                }
            )
            .await,
            Err(BackOfficeError::InvariantViolation(_))
        ));
    }

    #[tokio::test]
    async fn events_list_newest_first_per_organization() {
        let bo = back_office();
        let a = actor();
        let first = bo.create_app_event(a, draft(AppEventKind::Other)).await.unwrap();
        let second = bo.create_app_event(a, draft(AppEventKind::NoPrice)).await.unwrap();
        bo.create_app_event(actor(), draft(AppEventKind::Other))
            .await
            .unwrap();

        let listed = bo.list_app_events(a).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at >= listed[1].created_at);
        let ids: Vec<_> = listed.iter().map(|e| e.id).collect();
        assert!(ids.contains(&first.id) && ids.contains(&second.id));
    }
}
