use std::sync::Arc;

use shopfloor_infra::{BackOffice, BackOfficeStore};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    back_office: BackOffice,
}

impl AppServices {
    pub fn new(store: Arc<dyn BackOfficeStore>) -> Self {
        Self {
            back_office: BackOffice::new(store),
        }
    }

    pub fn back_office(&self) -> &BackOffice {
        &self.back_office
    }
}
