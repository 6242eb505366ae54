//! Core data model — §3. Defined locally; `deployment-manager` keeps its
//! own wire structs rather than sharing a types crate with the selector.

use serde::{Deserialize, Serialize};

pub type ServiceId = String;
pub type RoleId = String;
pub type ImageId = String;

/// A node has exactly one hardware tag, drawn from a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareTag(pub String);

impl HardwareTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl std::fmt::Display for HardwareTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KpiDescription {
    pub query: String,
    pub scope: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoleDescription {
    #[serde(rename = "roleId")]
    pub role_id: RoleId,
    #[serde(rename = "imageId")]
    pub image_id: ImageId,
    #[serde(rename = "hardwareRequirements")]
    pub hardware_requirements: Vec<String>,
    #[serde(default)]
    pub kpis: Vec<KpiDescription>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceDescription {
    #[serde(rename = "serviceId")]
    pub service_id: ServiceId,
    #[serde(default)]
    pub kpis: Vec<KpiDescription>,
    #[serde(rename = "roleDefinitions")]
    pub role_definitions: Vec<RoleDescription>,
}

/// Comparison operator extracted from a KPI query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">")]
    GreaterThan,
    /// Used for KPIs mapped from an `Alert`, which carries no operator.
    #[serde(rename = "==")]
    Equal,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::Equal => "==",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum KpiLevel {
    Met,
    Warning,
    Critical,
    Broken,
}

/// An evaluated KPI, as produced by the SLA manager or an `Alert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpi {
    pub query: String,
    pub value: f64,
    pub threshold: f64,
    pub operator: Operator,
    #[serde(rename = "associatedRole", default)]
    pub associated_role: RoleId,
    pub level: KpiLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleState {
    Stopped,
    Running,
    Updating,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resources {
    pub core: u32,
    pub ram: u32,
    pub disk: u32,
}

impl Default for Resources {
    /// §4.7: new roles default to `{core:30, ram:30, disk:30}`.
    fn default() -> Self {
        Self {
            core: 30,
            ram: 30,
            disk: 30,
        }
    }
}

/// Selector-owned state for a single role within a service. At most one
/// `Role` exists per `(serviceId, roleId)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "serviceId")]
    pub service_id: ServiceId,
    #[serde(rename = "roleId")]
    pub role_id: RoleId,
    #[serde(rename = "imageId")]
    pub image_id: ImageId,
    pub resources: Resources,
    pub state: RoleState,
    /// Carried alongside the role so Policy/Reconciler can see its KPIs
    /// without a second lookup into the originating `ServiceDescription`.
    #[serde(default)]
    pub kpis: Vec<KpiDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "serviceId")]
    pub service_id: ServiceId,
    #[serde(rename = "roleId")]
    pub role_id: RoleId,
    #[serde(rename = "startOrStop")]
    pub start_or_stop: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoppedEvent {
    #[serde(rename = "serviceId")]
    pub service_id: ServiceId,
    #[serde(rename = "roleId")]
    pub role_id: RoleId,
    #[serde(rename = "imageId")]
    pub image_id: ImageId,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Alert {
    #[serde(rename = "serviceId")]
    pub service_id: ServiceId,
    #[serde(rename = "slaId")]
    pub sla_id: String,
    pub kpis: Vec<AlertKpi>,
}

/// Shape of a KPI as carried inside an `Alert` — no operator/threshold, the
/// SLA manager has already evaluated it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertKpi {
    pub query: String,
    pub value: f64,
    #[serde(rename = "associatedRole", default)]
    pub associated_role: RoleId,
    pub level: KpiLevel,
}

impl From<AlertKpi> for Kpi {
    fn from(a: AlertKpi) -> Self {
        Kpi {
            query: a.query,
            value: a.value,
            threshold: a.value,
            operator: Operator::Equal,
            associated_role: a.associated_role,
            level: a.level,
        }
    }
}

/// Envelope returned by the SLA manager's `GET /api/v1/kpis/{serviceId}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KpiResponseEnvelope {
    #[serde(rename = "Response")]
    pub response: Vec<SlaAlert>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlaAlert {
    pub kpis: Vec<AlertKpi>,
}
