use std::env;

/// Runtime configuration, read once at startup and injected into the
/// services that need it.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub mongodb_uri: String,
    pub jwt_secret: String,

    // ExchangeRate API (rate tables)
    pub exchangerate_api_url: String,
    pub exchangerate_api_key: String,
    pub base_currency: String,

    // Alpha Vantage (daily stock bars)
    pub alphavantage_api_url: String,
    pub alphavantage_function: String,
    pub alphavantage_api_key: String,

    // Financial Modeling Prep (company profiles)
    pub fmp_profile_api_url: String,
    pub fmp_api_key: String,

    pub popular_currencies: Vec<String>,
    pub popular_stocks: Vec<String>,
    pub popular_companies: Vec<String>,
}

fn split_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Builds the configuration from environment variables. MONGODB_URI and
    /// JWT_SECRET are mandatory, everything else has a sensible default.
    pub fn from_env() -> Result<Self, String> {
        let mongodb_uri =
            env::var("MONGODB_URI").map_err(|_| "MONGODB_URI must be set".to_string())?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "5000".to_string()),
            mongodb_uri,
            jwt_secret,
            exchangerate_api_url: env::var("EXCHANGERATE_API_URL")
                .unwrap_or_else(|_| "https://v6.exchangerate-api.com/v6".to_string()),
            exchangerate_api_key: env::var("API_KEY_ERAPI").unwrap_or_default(),
            base_currency: env::var("BASE_CURRENCY")
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|_| "USD".to_string()),
            alphavantage_api_url: env::var("ALPHAVANTAGE_API_URL")
                .unwrap_or_else(|_| "https://www.alphavantage.co/query".to_string()),
            alphavantage_function: env::var("ALPHAVANTAGE_FUNCTION")
                .unwrap_or_else(|_| "TIME_SERIES_DAILY".to_string()),
            alphavantage_api_key: env::var("API_KEY_AV").unwrap_or_default(),
            fmp_profile_api_url: env::var("FMP_PROFILE_API_URL")
                .unwrap_or_else(|_| "https://financialmodelingprep.com/api/v3/profile".to_string()),
            fmp_api_key: env::var("API_KEY_FMP").unwrap_or_default(),
            popular_currencies: split_symbols(
                &env::var("POPULAR_CURRENCIES")
                    .unwrap_or_else(|_| "USD,EUR,GBP,JPY,CAD".to_string()),
            ),
            popular_stocks: split_symbols(
                &env::var("POPULAR_STOCKS")
                    .unwrap_or_else(|_| "AAPL,MSFT,GOOGL,AMZN,TSLA".to_string()),
            ),
            popular_companies: split_symbols(
                &env::var("POPULAR_COMPANIES")
                    .unwrap_or_else(|_| "AAPL,MSFT,GOOGL,AMZN,TSLA".to_string()),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_symbols_trims_and_uppercases() {
        assert_eq!(
            split_symbols(" aapl, msft ,GOOGL,"),
            vec!["AAPL".to_string(), "MSFT".to_string(), "GOOGL".to_string()]
        );
        assert!(split_symbols("").is_empty());
    }
}
