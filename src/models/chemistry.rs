// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pool chemistry reading (`ChemistryScreen`).

use super::{field, lenient_bool, lenient_f64, MalformedResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const RESOURCE: &str = "ChemistryScreen";

/// pH and ORP probe values as reported by the chlorinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemistryReading {
    pub current_ph: f64,
    pub ph_set_point: Option<f64>,
    pub ph_connected: Option<bool>,
    /// Oxidation-reduction potential in millivolts.
    pub current_orp: i64,
    pub orp_set_point: Option<i64>,
    pub orp_connected: Option<bool>,
}

impl ChemistryReading {
    /// Decode a `ChemistryScreen` body.
    ///
    /// `Ok(None)` when the API explicitly reports no chemistry.
    pub fn from_response(body: &Value) -> Result<Option<Self>, MalformedResponse> {
        let chemistry = match body.get("poolChemistry") {
            None => return Err(MalformedResponse::new(RESOURCE, "missing poolChemistry")),
            Some(Value::Null) => return Ok(None),
            Some(Value::Object(obj)) if obj.is_empty() => return Ok(None),
            Some(Value::Object(obj)) => obj,
            Some(other) => {
                return Err(MalformedResponse::new(
                    RESOURCE,
                    format!("poolChemistry is not an object: {}", other),
                ))
            }
        };

        let current_ph = field(chemistry, &["currentPh", "currentPH"])
            .and_then(lenient_f64)
            .ok_or_else(|| MalformedResponse::new(RESOURCE, "currentPh missing or not numeric"))?;
        let current_orp = field(chemistry, &["currentORP", "currentOrp"])
            .and_then(lenient_f64)
            .ok_or_else(|| MalformedResponse::new(RESOURCE, "currentORP missing or not numeric"))?;

        Ok(Some(Self {
            current_ph,
            ph_set_point: field(chemistry, &["setPointPh", "setPointPH"]).and_then(lenient_f64),
            ph_connected: field(chemistry, &["pHConnected", "phConnected"]).and_then(lenient_bool),
            current_orp: current_orp.round() as i64,
            orp_set_point: field(chemistry, &["setPointORP", "setPointOrp"])
                .and_then(lenient_f64)
                .map(|v| v.round() as i64),
            orp_connected: field(chemistry, &["orpConnected", "ORPConnected"])
                .and_then(lenient_bool),
        }))
    }
}
