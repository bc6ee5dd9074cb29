pub mod auth_service;
pub mod company_service;
pub mod currency_service;
pub mod stock_service;
pub mod user_service;

pub use company_service::*;
pub use currency_service::*;
pub use stock_service::*;
pub use user_service::*;

use chrono::{Duration, Utc};

/// Today's UTC date, the cache key for every freshness check.
pub(crate) fn today_str() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// The last `n` calendar dates (today included), newest first.
pub(crate) fn last_n_dates(n: i64) -> Vec<String> {
    (0..n)
        .map(|i| (Utc::now() - Duration::days(i)).format("%Y-%m-%d").to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_n_dates_counts_back_from_today() {
        let dates = last_n_dates(3);
        assert_eq!(dates.len(), 3);
        assert_eq!(dates[0], today_str());
        assert!(dates[0] > dates[1] && dates[1] > dates[2]);
    }
}
