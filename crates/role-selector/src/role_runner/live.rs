//! `HttpRoleRunner` — the real implementation, backed by `reqwest`.
//! Non-2xx responses are logged, never retried.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;

use super::RoleRunner;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct HttpRoleRunner {
    http: reqwest::Client,
    dsm_url: String,
}

#[derive(Serialize)]
struct StartBody<'a> {
    #[serde(rename = "serviceId")]
    service_id: &'a str,
    #[serde(rename = "roleId")]
    role_id: &'a str,
    #[serde(rename = "imageId")]
    image_id: &'a str,
}

#[derive(Serialize)]
struct StopBody<'a> {
    #[serde(rename = "serviceId")]
    service_id: &'a str,
    #[serde(rename = "roleId")]
    role_id: &'a str,
    #[serde(rename = "imageId")]
    image_id: &'a str,
    #[serde(rename = "removeContainer")]
    remove_container: bool,
}

impl HttpRoleRunner {
    pub fn new(dsm_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builder failed");
        Self {
            http,
            dsm_url: dsm_url.into(),
        }
    }

    async fn send<B: Serialize>(&self, url: &str, body: &B) {
        match self.http.put(url).json(body).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                tracing::warn!(url, status = %resp.status(), "deployment manager returned non-2xx");
            }
            Err(err) => {
                tracing::warn!(url, error = %err, "failed to reach deployment manager");
            }
        }
    }
}

impl RoleRunner for HttpRoleRunner {
    fn run<'a>(
        &'a self,
        service_id: &'a str,
        role_id: &'a str,
        image_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/start", self.dsm_url);
            let body = StartBody {
                service_id,
                role_id,
                image_id,
            };
            self.send(&url, &body).await;
        })
    }

    fn stop<'a>(
        &'a self,
        service_id: &'a str,
        role_id: &'a str,
        image_id: &'a str,
        remove: bool,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/stop", self.dsm_url);
            let body = StopBody {
                service_id,
                role_id,
                image_id,
                remove_container: remove,
            };
            self.send(&url, &body).await;
        })
    }
}
