//! KPI Retriever — §4.4. Pulls the current KPI evaluation set for a
//! service from the SLA manager.

use std::time::Duration;

use thiserror::Error;

use crate::types::Kpi;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
#[error("failed to fetch KPIs for service {service_id}: {detail}")]
pub struct KpiFetchFailed {
    pub service_id: String,
    pub detail: String,
}

#[derive(Clone)]
pub struct KpiRetriever {
    http: reqwest::Client,
    sla_manager_url: String,
}

impl KpiRetriever {
    pub fn new(sla_manager_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builder failed");
        Self {
            http,
            sla_manager_url: sla_manager_url.into(),
        }
    }

    pub async fn get(&self, service_id: &str) -> Result<Vec<Kpi>, KpiFetchFailed> {
        let url = format!("{}/api/v1/kpis/{}", self.sla_manager_url, service_id);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| KpiFetchFailed {
                service_id: service_id.to_string(),
                detail: e.to_string(),
            })?;

        let envelope: crate::types::KpiResponseEnvelope =
            response.json().await.map_err(|e| KpiFetchFailed {
                service_id: service_id.to_string(),
                detail: e.to_string(),
            })?;

        Ok(envelope
            .response
            .into_iter()
            .flat_map(|alert| alert.kpis)
            .map(Kpi::from)
            .collect())
    }
}
