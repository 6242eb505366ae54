//! Wire types exchanged with the role-selector. Defined locally rather than
//! shared, since the two services are independently deployed and versioned.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StartRoleCommand {
    #[serde(rename = "serviceId")]
    pub service_id: String,
    #[serde(rename = "roleId")]
    pub role_id: String,
    #[serde(rename = "imageId")]
    pub image_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StopRoleCommand {
    #[serde(rename = "serviceId")]
    pub service_id: String,
    #[serde(rename = "roleId")]
    pub role_id: String,
    #[serde(rename = "imageId")]
    pub image_id: String,
    #[serde(rename = "removeContainer")]
    pub remove_container: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoppedEvent {
    #[serde(rename = "serviceId")]
    pub service_id: String,
    #[serde(rename = "roleId")]
    pub role_id: String,
    #[serde(rename = "imageId")]
    pub image_id: String,
}
