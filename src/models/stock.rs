use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Daily stock bar, keyed by (symbole, date). Created once, immutable.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Action {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Ticker symbol, ex: "AAPL"
    pub symbole: String,
    /// Trading day, ex: "2025-06-05"
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct ActionView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub symbole: String,
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl From<&Action> for ActionView {
    fn from(action: &Action) -> Self {
        ActionView {
            id: action.id.map(|id| id.to_hex()),
            symbole: action.symbole.clone(),
            date: action.date.clone(),
            open: action.open,
            high: action.high,
            low: action.low,
            close: action.close,
            volume: action.volume,
        }
    }
}

/// Purchase cost of a quantity of shares, in the requested currency.
/// `date` is the trading day that was actually used, which may be the
/// latest available one when the requested day has no bar.
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct CoutAchat {
    pub symbole: String,
    pub date: String,
    pub quantite: f64,
    pub devise: String,
    pub cout_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taux: Option<f64>,
}
