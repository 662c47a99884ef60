//! The admin settings document.

use tracing::info;

use jobquest_models::AdminSettings;

use crate::client::FirestoreClient;
use crate::codec::{document_to_settings, settings_to_fields};
use crate::error::FirestoreResult;
use crate::types::{Document, Write};

const SETTINGS: &str = "settings";
const ADMIN: &str = "admin";

/// Repository for the single `settings/admin` document.
#[derive(Clone)]
pub struct SettingsRepository {
    client: FirestoreClient,
}

impl SettingsRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    pub async fn get(&self) -> FirestoreResult<Option<AdminSettings>> {
        self.client
            .get_document(SETTINGS, ADMIN)
            .await?
            .map(|doc| document_to_settings(&doc))
            .transpose()
    }

    /// Create or overwrite.
    pub async fn save(&self, settings: &AdminSettings) -> FirestoreResult<()> {
        let document = Document::named(
            self.client.full_document_name(SETTINGS, ADMIN),
            settings_to_fields(settings),
        );
        self.client.batch_write(vec![Write::upsert(document)]).await?;
        info!(email = %settings.email, "Saved admin settings");
        Ok(())
    }
}
