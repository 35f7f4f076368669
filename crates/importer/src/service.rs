//! Transport seam between [`ImportSession`](crate::session::ImportSession)
//! and the import service.

use async_trait::async_trait;
use contacthub_core::fields::FieldOptions;
use contacthub_core::import::{ConfirmMappingRequest, ConfirmMappingResponse, UploadResponse};

use crate::api::{ImportApi, ImportApiError, UploadFile};

/// The three remote calls an import attempt needs.
#[async_trait]
pub trait ImportService: Send + Sync {
    async fn upload_contacts_file(
        &self,
        file: &UploadFile,
        owner: &str,
    ) -> Result<UploadResponse, ImportApiError>;

    async fn confirm_mapping(
        &self,
        request: &ConfirmMappingRequest,
    ) -> Result<ConfirmMappingResponse, ImportApiError>;

    async fn field_options(&self) -> Result<FieldOptions, ImportApiError>;
}

#[async_trait]
impl ImportService for ImportApi {
    async fn upload_contacts_file(
        &self,
        file: &UploadFile,
        owner: &str,
    ) -> Result<UploadResponse, ImportApiError> {
        ImportApi::upload_contacts_file(self, file, owner).await
    }

    async fn confirm_mapping(
        &self,
        request: &ConfirmMappingRequest,
    ) -> Result<ConfirmMappingResponse, ImportApiError> {
        ImportApi::confirm_mapping(self, request).await
    }

    async fn field_options(&self) -> Result<FieldOptions, ImportApiError> {
        ImportApi::field_options(self).await
    }
}
