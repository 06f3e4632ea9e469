/// Model snapshot storage
///
/// The trained model's hyperparameters are published as a JSON object in an
/// object-storage bucket (Supabase Storage compatible API). Every refresh
/// retrains from scratch, so the snapshot only needs to carry the parameters.
use reqwest::Client as HttpClient;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    services::svd::SvdParams,
};

#[derive(Clone)]
pub struct ModelStore {
    http_client: HttpClient,
    base_url: String,
    bucket: String,
    path: String,
    api_key: Option<String>,
}

impl ModelStore {
    pub fn new(base_url: String, bucket: String, path: String, api_key: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url,
            bucket,
            path,
            api_key,
        }
    }

    /// Builds a store from configuration, `None` when no storage URL is set
    pub fn from_config(config: &Config) -> Option<Self> {
        config.model_store_url.as_ref().map(|url| {
            Self::new(
                url.clone(),
                config.model_store_bucket.clone(),
                config.model_store_path.clone(),
                config.model_store_key.clone(),
            )
        })
    }

    fn object_url(&self) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.bucket,
            self.path.trim_start_matches('/')
        )
    }

    /// Downloads and parses the snapshot
    pub async fn fetch_params(&self) -> AppResult<SvdParams> {
        let url = self.object_url();
        tracing::debug!(url = %url, "Downloading model snapshot");

        let mut request = self.http_client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key).header("apikey", key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                "Model snapshot download failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Model store returned status {}: {}",
                status, body
            )));
        }

        let bytes = response.bytes().await?;
        parse_params(&bytes)
    }

    /// Fetches the snapshot, falling back to defaults when it cannot be loaded
    pub async fn load_or_default(store: Option<&Self>) -> SvdParams {
        let Some(store) = store else {
            tracing::info!("No model store configured, using default hyperparameters");
            return SvdParams::default();
        };

        match store.fetch_params().await {
            Ok(params) => {
                tracing::info!(
                    n_factors = params.n_factors,
                    n_epochs = params.n_epochs,
                    "Loaded model snapshot"
                );
                params
            }
            Err(e) => {
                tracing::warn!(error = %e, "Model snapshot unavailable, using default hyperparameters");
                SvdParams::default()
            }
        }
    }
}

fn parse_params(bytes: &[u8]) -> AppResult<SvdParams> {
    let params: SvdParams = serde_json::from_slice(bytes)
        .map_err(|e| AppError::ExternalApi(format!("Invalid model snapshot: {}", e)))?;
    params.validate()?;
    Ok(params)
}
