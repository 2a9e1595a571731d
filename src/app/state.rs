use std::sync::Arc;

use crate::app::templates::Templates;
use crate::domain::ports::{ConfigProvider, Store};
use crate::utils::error::Result;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub templates: Templates,
    pub session_ttl_minutes: i64,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &impl ConfigProvider) -> Result<Arc<Self>> {
        let templates = Templates::load()?;

        Ok(Arc::new(Self {
            store,
            templates,
            session_ttl_minutes: config.session_ttl_minutes(),
            secure_cookies: config.secure_cookies(),
        }))
    }
}
