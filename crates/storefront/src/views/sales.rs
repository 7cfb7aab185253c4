//! Home page sales summary for the business being acted as.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

use crate::api::{Granularity, MarketplaceApi, SalesReportEntry, SalesReportQuery};
use crate::outcome::{Operation, Outcome, Route, resolve};
use crate::session::Session;

/// Sunday through Saturday of the week containing `today`, both at UTC
/// midnight.
pub fn week_range(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let back = u64::from(today.weekday().num_days_from_sunday());
    let sunday = today.checked_sub_days(Days::new(back)).unwrap_or(today);
    let saturday = sunday.checked_add_days(Days::new(6)).unwrap_or(sunday);
    (midnight(sunday), midnight(saturday))
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Whole amounts print without a decimal point.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount}")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesSummary {
    pub business_id: Option<u64>,
    pub total_sales: u64,
    pub total_revenue: f64,
    pub currency_symbol: String,
    pub currency_code: String,
    pub hide_graph: bool,
}

impl SalesSummary {
    pub fn from_entries(entries: &[SalesReportEntry]) -> Self {
        Self {
            total_sales: entries.iter().map(|e| e.total_sales).sum(),
            total_revenue: entries.iter().map(|e| e.total_revenue).sum(),
            hide_graph: entries.is_empty(),
            ..Default::default()
        }
    }

    /// Totals for the current week. Acting as a user there is nothing to
    /// show, so no request is made.
    pub fn load(
        api: &dyn MarketplaceApi,
        session: &Session,
        today: NaiveDate,
    ) -> Result<Self, Outcome> {
        let Some(business_id) = session.acting_as() else {
            return Ok(Self {
                hide_graph: true,
                ..Default::default()
            });
        };
        let business = api
            .get_business(business_id)
            .map_err(|failure| resolve(Operation::Other, &failure))?
            .data;
        let (from_date, to_date) = week_range(today);
        let query = SalesReportQuery {
            from_date,
            to_date,
            granularity: Granularity::Total,
        };
        let entries = api
            .sales_report(business_id, &query)
            .map_err(|failure| resolve(Operation::Other, &failure))?
            .data;

        let mut summary = Self::from_entries(&entries);
        summary.business_id = Some(business_id);
        summary.currency_symbol = business.currency_symbol.unwrap_or_default();
        summary.currency_code = business.currency_code.unwrap_or_default();
        tracing::debug!(business_id, total_sales = summary.total_sales, "sales summary loaded");
        Ok(summary)
    }

    pub fn total_sales_label(&self) -> String {
        format!("Total Sales: {}", self.total_sales)
    }

    pub fn total_revenue_label(&self) -> String {
        format!(
            "Total Revenue: {}{} {}",
            self.currency_symbol,
            format_amount(self.total_revenue),
            self.currency_code
        )
        .trim_end()
        .to_string()
    }

    pub fn sales_route(&self) -> Option<Route> {
        self.business_id.map(Route::BusinessSales)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::query::format_instant;

    fn range_strings(y: i32, m: u32, d: u32) -> (String, String) {
        let (from, to) = week_range(NaiveDate::from_ymd_opt(y, m, d).unwrap());
        (format_instant(from), format_instant(to))
    }

    #[test]
    fn week_runs_sunday_to_saturday() {
        let expected = (
            "2021-10-24T00:00:00.000Z".to_string(),
            "2021-10-30T00:00:00.000Z".to_string(),
        );
        assert_eq!(range_strings(2021, 10, 24), expected);
        assert_eq!(range_strings(2021, 10, 27), expected);
        assert_eq!(range_strings(2021, 10, 30), expected);
        assert_ne!(range_strings(2021, 10, 31), expected);
    }

    #[test]
    fn labels() {
        let mut summary = SalesSummary::from_entries(&[SalesReportEntry {
            granularity_name: None,
            total_sales: 150,
            total_revenue: 2000.0,
        }]);
        summary.currency_symbol = "$".into();
        summary.currency_code = "asd".into();
        assert_eq!(summary.total_sales_label(), "Total Sales: 150");
        assert_eq!(summary.total_revenue_label(), "Total Revenue: $2000 asd");
        assert!(!summary.hide_graph);
        assert_eq!(format_amount(12.5), "12.5");
    }

    #[test]
    fn no_entries_hides_graph() {
        assert!(SalesSummary::from_entries(&[]).hide_graph);
    }
}
