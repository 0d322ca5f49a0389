//! Declarative registry of report endpoints.
//!
//! Every report is one [`EndpointDescriptor`]: the URL suffix it is
//! mounted under, the prefix its database name must carry, the SQL
//! template, the ordered date parameters bound into that template and the
//! row scanner. The router and the root catalog are both generated from
//! [`ENDPOINTS`]; adding a report never touches the dispatcher.
//!
//! Every template ends with a `LIMIT ?` bound to the configured row cap,
//! after the date parameters.

use crate::records::{self, ScanFn};

/// Average utilization per day from the `riw_view` of a rate archive.
pub const DAILY_AVERAGE_SQL: &str = "
    SELECT avg(util_e18) AS avg_util, date(stamp_iso) AS day, count(*) AS n
    FROM riw_view
    WHERE stamp_iso > ? AND stamp_iso <= ? || ' 23:59:59'
    GROUP BY day
    ORDER BY day
    LIMIT ?";

/// Open/high/low/close of the mid quote per day from the `rtw_view` of a
/// quote archive.
pub const DAILY_OHLC_SQL: &str = "
    WITH ranked_quotes AS (
        SELECT
            (quote_bid_e18 + quote_ask_e18) / 2 AS mid,
            date(quote_time_iso) AS day,
            ROW_NUMBER() OVER (PARTITION BY date(quote_time_iso) ORDER BY quote_time_iso ASC) AS rn_beg,
            ROW_NUMBER() OVER (PARTITION BY date(quote_time_iso) ORDER BY quote_time_iso DESC) AS rn_end
        FROM rtw_view
        WHERE quote_time_iso > ? AND quote_time_iso <= ? || ' 23:59:59'
    )
    SELECT
        MAX(CASE WHEN rn_beg = 1 THEN mid END) AS open,
        MAX(mid) AS high,
        MIN(mid) AS low,
        MAX(CASE WHEN rn_end = 1 THEN mid END) AS close,
        day,
        COUNT(*) AS n
    FROM ranked_quotes
    GROUP BY day
    ORDER BY day
    LIMIT ?";

/// Static definition of one report endpoint.
#[derive(Debug, Clone, Copy)]
pub struct EndpointDescriptor {
    /// URL suffix after `/{db_name}`, e.g. `/daily_average.json`.
    pub suffix: &'static str,
    /// Prefix the database name must start with.
    pub required_prefix: &'static str,
    /// Parameterized SQL; placeholders are bound, never formatted.
    pub query: &'static str,
    /// Date parameters in binding order.
    pub params: &'static [&'static str],
    /// Decodes one result row.
    pub scan: ScanFn,
    /// Human-readable description for the catalog.
    pub description: &'static str,
    /// Example request path for the catalog.
    pub example: &'static str,
}

impl EndpointDescriptor {
    /// Axum route pattern, e.g. `/{db_name}/daily_average.json`.
    pub fn route_path(&self) -> String {
        format!("/{{db_name}}{}", self.suffix)
    }

    /// Catalog name: the suffix without the leading `/` and `.json`.
    pub fn name(&self) -> &'static str {
        let name = self.suffix.trim_start_matches('/');
        name.strip_suffix(".json").unwrap_or(name)
    }

    /// Query string template, e.g. `?lhs=YYYY-MM-DD&rhs=YYYY-MM-DD`.
    pub fn params_template(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }
        let pairs: Vec<String> = self
            .params
            .iter()
            .map(|param| format!("{param}=YYYY-MM-DD"))
            .collect();
        format!("?{}", pairs.join("&"))
    }
}

/// All report endpoints. Suffixes are unique.
pub static ENDPOINTS: &[EndpointDescriptor] = &[
    EndpointDescriptor {
        suffix: "/daily_average.json",
        required_prefix: "ri_",
        query: DAILY_AVERAGE_SQL,
        params: &["lhs", "rhs"],
        scan: records::scan_daily_average,
        description: "Daily average utilization rates",
        example: "/ri_apow_supply_0/daily_average.json?lhs=2025-11-15&rhs=2025-12-15",
    },
    EndpointDescriptor {
        suffix: "/daily_ohlc.json",
        required_prefix: "rt_",
        query: DAILY_OHLC_SQL,
        params: &["lhs", "rhs"],
        scan: records::scan_daily_ohlc,
        description: "Daily OHLC price quotes",
        example: "/rt_apow_xpow_0/daily_ohlc.json?lhs=2025-11-15&rhs=2025-12-15",
    },
];

/// Look up an endpoint by URL suffix.
pub fn endpoint(suffix: &str) -> Option<&'static EndpointDescriptor> {
    ENDPOINTS.iter().find(|endpoint| endpoint.suffix == suffix)
}
