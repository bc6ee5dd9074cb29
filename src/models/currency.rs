use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Daily currency snapshot, keyed by (nom, date_maj). Only the base
/// currency is ever written; it carries the complete conversion table and
/// views for other codes are reconstructed from it on read.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Devise {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Currency code, ex: "EUR"
    pub nom: String,
    /// Rate against the base currency
    pub taux: f64,
    /// Snapshot date, ex: "2025-06-06"
    pub date_maj: String,
    /// Base currency code the table is denominated in
    pub base_code: String,
    /// Full code → rate table
    pub conversion_rates: HashMap<String, f64>,
}

/// Serialized currency snapshot. Reconstructed (non-base) views have no id.
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct DeviseView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub nom: String,
    pub taux: f64,
    pub date_maj: String,
    pub base_code: String,
    pub conversion_rates: HashMap<String, f64>,
}

impl From<&Devise> for DeviseView {
    fn from(devise: &Devise) -> Self {
        DeviseView {
            id: devise.id.map(|id| id.to_hex()),
            nom: devise.nom.clone(),
            taux: devise.taux,
            date_maj: devise.date_maj.clone(),
            base_code: devise.base_code.clone(),
            conversion_rates: devise.conversion_rates.clone(),
        }
    }
}

/// Result of a currency conversion.
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct ConversionResult {
    pub code_source: String,
    pub code_cible: String,
    pub montant_source: f64,
    pub montant_converti: f64,
    pub taux_source: f64,
    pub taux_cible: f64,
    pub date_maj: String,
}
