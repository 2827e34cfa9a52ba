use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        document::{self, DocumentType},
        line_item, procurement_request,
    },
    errors::ServiceError,
};

/// Date predicate for report filtering, evaluated against the invoice
/// date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Today,
    Week,
    Month,
    #[default]
    All,
}

impl DateRange {
    fn matches(&self, invoice_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(date) = invoice_date else {
            // Requests without an invoice only show up under `all`.
            return *self == DateRange::All;
        };
        match self {
            DateRange::Today => date.date_naive() == now.date_naive(),
            DateRange::Week => date >= now - Duration::days(7),
            DateRange::Month => date >= now - Duration::days(30),
            DateRange::All => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportItem {
    pub name: String,
    pub quantity: i32,
    pub unit: String,
    pub quoted_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportInvoice {
    pub invoice_number: String,
    pub invoice_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub id: Uuid,
    pub request_number: String,
    pub franchise_id: Uuid,
    pub franchise_name: String,
    pub owner_name: Option<String>,
    pub assigned_vendor_id: Option<Uuid>,
    pub status: String,
    pub actual_weight: Option<Decimal>,
    pub total_quoted_amount: Decimal,
    pub items: Vec<ReportItem>,
    pub invoice: Option<ReportInvoice>,
}

/// Aggregate totals over a set of requests.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub request_count: usize,
    pub total_actual_weight: Decimal,
    pub total_quoted_amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementReport {
    /// Totals over the unfiltered full set (summary cards).
    pub summary: ReportTotals,
    /// Totals over the filtered set (table footer).
    pub filtered_totals: ReportTotals,
    pub rows: Vec<ReportRow>,
    pub page: u64,
    pub per_page: u64,
    pub total_rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub search: Option<String>,
    pub date_range: DateRange,
    pub page: u64,
    pub per_page: u64,
}

/// Read-side rollups over the ledger. Stateless: every call re-evaluates
/// against current ledger state.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_reports(
        &self,
        filter: ReportFilter,
    ) -> Result<ProcurementReport, ServiceError> {
        let db = &*self.db;
        let now = Utc::now();

        let requests = procurement_request::Entity::find()
            .order_by_desc(procurement_request::Column::CreatedAt)
            .all(db)
            .await?;

        let mut items_by_request: HashMap<Uuid, Vec<line_item::Model>> = HashMap::new();
        for item in line_item::Entity::find()
            .order_by_asc(line_item::Column::LineNumber)
            .all(db)
            .await?
        {
            items_by_request.entry(item.request_id).or_default().push(item);
        }

        let mut invoice_by_request: HashMap<Uuid, document::Model> = HashMap::new();
        for doc in document::Entity::find()
            .filter(document::Column::DocType.eq(DocumentType::Invoice))
            .order_by_asc(document::Column::Sequence)
            .all(db)
            .await?
        {
            // Ascending sequence: the latest regeneration wins the slot.
            invoice_by_request.insert(doc.request_id, doc);
        }

        let rows: Vec<ReportRow> = requests
            .iter()
            .map(|request| {
                let items = items_by_request
                    .get(&request.id)
                    .map(|items| {
                        items
                            .iter()
                            .map(|item| ReportItem {
                                name: item.name.clone(),
                                quantity: item.quantity,
                                unit: item.unit.clone(),
                                quoted_price: item.quoted_price,
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                let invoice = invoice_by_request.get(&request.id).map(|doc| ReportInvoice {
                    invoice_number: doc.document_number.clone(),
                    invoice_date: doc.generated_at,
                });
                ReportRow {
                    id: request.id,
                    request_number: request.request_number.clone(),
                    franchise_id: request.franchise_id,
                    franchise_name: request.franchise_name.clone(),
                    owner_name: request.owner_name.clone(),
                    assigned_vendor_id: request.vendor_id,
                    status: request.status.to_string(),
                    actual_weight: request.actual_weight,
                    total_quoted_amount: request.total_quoted_amount,
                    items,
                    invoice,
                }
            })
            .collect();

        // Summary cards aggregate the full, unfiltered set.
        let summary = totals(rows.iter());

        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let filtered: Vec<ReportRow> = rows
            .into_iter()
            .filter(|row| {
                filter
                    .date_range
                    .matches(row.invoice.as_ref().map(|i| i.invoice_date), now)
            })
            .filter(|row| match &needle {
                None => true,
                Some(needle) => {
                    row.invoice
                        .as_ref()
                        .map(|i| i.invoice_number.to_lowercase().contains(needle))
                        .unwrap_or(false)
                        || row.franchise_name.to_lowercase().contains(needle)
                        || row
                            .owner_name
                            .as_ref()
                            .map(|name| name.to_lowercase().contains(needle))
                            .unwrap_or(false)
                }
            })
            .collect();

        let filtered_totals = totals(filtered.iter());
        let total_rows = filtered.len();

        let per_page = filter.per_page.max(1);
        let page = filter.page.max(1);
        let offset = ((page - 1) * per_page) as usize;
        let rows = filtered
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect();

        Ok(ProcurementReport {
            summary,
            filtered_totals,
            rows,
            page,
            per_page,
            total_rows,
        })
    }
}

fn totals<'a>(rows: impl Iterator<Item = &'a ReportRow>) -> ReportTotals {
    let mut count = 0usize;
    let mut weight = Decimal::ZERO;
    let mut amount = Decimal::ZERO;
    for row in rows {
        count += 1;
        weight += row.actual_weight.unwrap_or(Decimal::ZERO);
        amount += row.total_quoted_amount;
    }
    ReportTotals {
        request_count: count,
        total_actual_weight: weight,
        total_quoted_amount: amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(weight: Option<Decimal>, amount: Decimal) -> ReportRow {
        ReportRow {
            id: Uuid::new_v4(),
            request_number: "PR-TEST".to_string(),
            franchise_id: Uuid::new_v4(),
            franchise_name: "North Node".to_string(),
            owner_name: None,
            assigned_vendor_id: None,
            status: "completed".to_string(),
            actual_weight: weight,
            total_quoted_amount: amount,
            items: vec![],
            invoice: None,
        }
    }

    #[test]
    fn totals_sum_weight_and_amount() {
        use rust_decimal_macros::dec;

        let rows = vec![
            row(Some(dec!(9.8)), dec!(200)),
            row(None, dec!(50)),
            row(Some(dec!(1.2)), dec!(0)),
        ];
        let t = totals(rows.iter());
        assert_eq!(t.request_count, 3);
        assert_eq!(t.total_actual_weight, dec!(11.0));
        assert_eq!(t.total_quoted_amount, dec!(250));
    }

    #[test]
    fn date_range_without_invoice_only_matches_all() {
        let now = Utc::now();
        assert!(DateRange::All.matches(None, now));
        assert!(!DateRange::Today.matches(None, now));
        assert!(!DateRange::Week.matches(None, now));
        assert!(!DateRange::Month.matches(None, now));
    }

    #[test]
    fn date_range_windows() {
        let now = Utc::now();
        let yesterday = now - Duration::days(1);
        let last_fortnight = now - Duration::days(14);

        assert!(DateRange::Today.matches(Some(now), now));
        assert!(!DateRange::Today.matches(Some(last_fortnight), now));
        assert!(DateRange::Week.matches(Some(yesterday), now));
        assert!(!DateRange::Week.matches(Some(last_fortnight), now));
        assert!(DateRange::Month.matches(Some(last_fortnight), now));
        assert!(DateRange::All.matches(Some(last_fortnight), now));
    }
}
