//! Service Description Parser — §4.1. Filters roles by hardware tag,
//! extracts KPIs, and parses each KPI query's operator/threshold.

use thiserror::Error;

use crate::types::{HardwareTag, Kpi, KpiDescription, KpiLevel, Operator, RoleDescription, ServiceDescription};

#[derive(Debug, Error, PartialEq)]
#[error("malformed KPI query: {0}")]
pub struct MalformedKpi(pub String);

pub struct ParsedServiceDescription {
    pub eligible_roles: Vec<RoleDescription>,
    /// Service-level KPIs (`associatedRole == ""`) plus role-level KPIs for
    /// each eligible role (`associatedRole == roleId`).
    pub kpis: Vec<Kpi>,
}

/// A role is eligible for this node iff the *first* element of its hardware
/// requirements equals the node's tag (matches original_source's single-tag
/// comparison, not a full set-membership check).
fn is_eligible(role: &RoleDescription, hardware: &HardwareTag) -> bool {
    role.hardware_requirements
        .first()
        .map(|tag| tag == &hardware.0)
        .unwrap_or(false)
}

/// Scan once for the first `<` or `>`; everything after it up to the next
/// whitespace is parsed as the threshold. A trailing `=` (as in `>=`/`<=`)
/// is tolerated but the operator is still just `<`/`>` per the data model.
fn parse_operator_and_threshold(query: &str) -> Result<(Operator, f64), MalformedKpi> {
    let op_idx = query
        .find(['<', '>'])
        .ok_or_else(|| MalformedKpi(query.to_string()))?;

    let operator = if query.as_bytes()[op_idx] == b'<' {
        Operator::LessThan
    } else {
        Operator::GreaterThan
    };

    let rest = &query[op_idx + 1..];
    let rest = rest.strip_prefix('=').unwrap_or(rest);
    let rest = rest.trim_start();
    let threshold_str: String = rest.chars().take_while(|c| !c.is_whitespace()).collect();

    let threshold = threshold_str
        .parse::<f64>()
        .map_err(|_| MalformedKpi(query.to_string()))?;

    Ok((operator, threshold))
}

fn kpi_from_description(desc: &KpiDescription, associated_role: &str) -> Result<Kpi, MalformedKpi> {
    let (operator, threshold) = parse_operator_and_threshold(&desc.query)?;
    Ok(Kpi {
        query: desc.query.clone(),
        value: 0.0,
        threshold,
        operator,
        associated_role: associated_role.to_string(),
        level: KpiLevel::Met,
    })
}

/// Parse a `ServiceDescription` for this node's hardware tag, returning the
/// eligible roles and the full parsed KPI set.
pub fn parse(
    description: &ServiceDescription,
    hardware: &HardwareTag,
) -> Result<ParsedServiceDescription, MalformedKpi> {
    let mut eligible_roles = Vec::new();
    for role in &description.role_definitions {
        if is_eligible(role, hardware) {
            eligible_roles.push(role.clone());
        } else {
            tracing::info!(
                service_id = %description.service_id,
                role_id = %role.role_id,
                hardware = %hardware,
                "role dropped: hardware requirement does not match this node"
            );
        }
    }

    let mut kpis = Vec::new();
    for kpi in &description.kpis {
        kpis.push(kpi_from_description(kpi, "")?);
    }
    for role in &eligible_roles {
        for kpi in &role.kpis {
            kpis.push(kpi_from_description(kpi, &role.role_id)?);
        }
    }

    Ok(ParsedServiceDescription {
        eligible_roles,
        kpis,
    })
}
