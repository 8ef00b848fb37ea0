//! Job search query builder.
//!
//! One `push_filters` function appends the predicate set to both the data
//! query and the count query, so the two can never disagree on which listings
//! match. Sorting, LIMIT and OFFSET are applied to the data query only.

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::listing::{is_valid_category, is_valid_job_type, JobListingWithEmployer};

pub const PAGE_SIZE: i64 = 10;

/// Upper bound on the requested page number. Far past any real result set;
/// keeps the OFFSET arithmetic inside i64 for an absurd query parameter.
pub const MAX_PAGE: i64 = 1_000_000;

/// Optional filter criteria for the public job search. All fields come from
/// query-string parameters and default to "no filter". The typed fields parse
/// leniently: `?page=abc` or `?featured=banana` reads as "not supplied", so a
/// mangled URL still renders the default browse page instead of a 400.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub job_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub featured: Option<bool>,
    pub sort: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub page: Option<i64>,
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.and_then(|s| match s.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }))
}

impl SearchParams {
    /// Requested page, clamped to `1..=MAX_PAGE`. Pages past the last one are
    /// allowed and simply return an empty set.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey::parse(self.sort.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Newest,
    Oldest,
    Salary,
    Deadline,
}

impl SortKey {
    /// Unrecognized values fall back to `Newest`, the default ordering.
    pub fn parse(s: Option<&str>) -> SortKey {
        match s {
            Some("oldest") => SortKey::Oldest,
            Some("salary") => SortKey::Salary,
            Some("deadline") => SortKey::Deadline,
            _ => SortKey::Newest,
        }
    }

    /// Exact tie-break contract per sort key. Featured listings win ties in
    /// every mode; in the default mode they lead outright.
    pub fn order_by(&self) -> &'static str {
        match self {
            SortKey::Salary => {
                "j.salary_max DESC NULLS LAST, j.salary_min DESC NULLS LAST, j.featured DESC"
            }
            SortKey::Deadline => "j.expires_at ASC NULLS LAST, j.featured DESC",
            SortKey::Oldest => "j.created_at ASC, j.featured DESC",
            SortKey::Newest => "j.featured DESC, j.created_at DESC",
        }
    }
}

/// One page of search results plus the totals the pagination UI needs.
#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub jobs: Vec<JobListingWithEmployer>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

impl SearchPage {
    /// The degraded "no jobs found" page returned when a query faults.
    pub fn empty(page: i64) -> Self {
        SearchPage {
            jobs: Vec::new(),
            total: 0,
            page,
            total_pages: 1,
        }
    }
}

/// Ceiling division by the page size, floored at one page so an empty result
/// still renders a pagination footer.
pub fn total_pages(total: i64) -> i64 {
    ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1)
}

/// Saturating so an out-of-range page can never overflow, even when the
/// caller bypasses `SearchParams::page()`.
pub fn offset_for_page(page: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(PAGE_SIZE)
}

/// Appends the shared predicate set. Base predicate: listing is open for
/// applications (status active, not past its expiry). Each present filter
/// adds one AND-ed predicate; the keyword expands to two OR-ed ILIKE matches.
/// Unknown category/job_type values append nothing, mirroring filter values
/// outside the fixed enumerations being dropped.
fn push_filters(qb: &mut QueryBuilder<'static, Postgres>, params: &SearchParams) {
    qb.push(" WHERE j.status = 'active' AND (j.expires_at IS NULL OR j.expires_at > now())");

    if let Some(keyword) = non_empty(params.keyword.as_deref()) {
        let pattern = format!("%{keyword}%");
        qb.push(" AND (j.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR j.description ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if let Some(location) = non_empty(params.location.as_deref()) {
        qb.push(" AND j.location ILIKE ");
        qb.push_bind(format!("%{location}%"));
    }

    if let Some(category) = non_empty(params.category.as_deref()) {
        if is_valid_category(category) {
            qb.push(" AND j.category = ");
            qb.push_bind(category.to_string());
        }
    }

    if let Some(job_type) = non_empty(params.job_type.as_deref()) {
        if is_valid_job_type(job_type) {
            qb.push(" AND j.job_type = ");
            qb.push_bind(job_type.to_string());
        }
    }

    if params.featured == Some(true) {
        qb.push(" AND j.featured = TRUE");
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

const SELECT_HEAD: &str = "SELECT j.id, j.employer_id, j.title, j.description, j.requirements, \
     j.location, j.category, j.job_type, j.salary_min, j.salary_max, j.status, j.featured, \
     j.expires_at, j.created_at, COALESCE(NULLIF(u.company_name, ''), u.name) AS employer_label \
     FROM job_listings j JOIN users u ON u.id = j.employer_id";

const COUNT_HEAD: &str =
    "SELECT COUNT(*) FROM job_listings j JOIN users u ON u.id = j.employer_id";

/// Data query: filters + sort + pagination.
pub fn build_search_query(params: &SearchParams) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SELECT_HEAD);
    push_filters(&mut qb, params);
    qb.push(" ORDER BY ");
    qb.push(params.sort_key().order_by());
    qb.push(" LIMIT ");
    qb.push_bind(PAGE_SIZE);
    qb.push(" OFFSET ");
    qb.push_bind(offset_for_page(params.page()));
    qb
}

/// Count query: identical predicates, no sort, no pagination.
pub fn build_count_query(params: &SearchParams) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(COUNT_HEAD);
    push_filters(&mut qb, params);
    qb
}

/// Executes the count and data queries for one result page.
pub async fn run_search(pool: &PgPool, params: &SearchParams) -> Result<SearchPage, sqlx::Error> {
    let total: i64 = build_count_query(params)
        .build_query_scalar()
        .fetch_one(pool)
        .await?;

    let jobs: Vec<JobListingWithEmployer> = build_search_query(params)
        .build_query_as()
        .fetch_all(pool)
        .await?;

    Ok(SearchPage {
        jobs,
        total,
        page: params.page(),
        total_pages: total_pages(total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(f: impl FnOnce(&mut SearchParams)) -> SearchParams {
        let mut p = SearchParams::default();
        f(&mut p);
        p
    }

    /// The predicate section of a built query: everything after WHERE, up to
    /// ORDER BY when present.
    fn predicates(sql: &str) -> &str {
        let start = sql.find(" WHERE ").expect("query has a WHERE clause");
        let rest = &sql[start..];
        match rest.find(" ORDER BY ") {
            Some(end) => &rest[..end],
            None => rest,
        }
    }

    #[test]
    fn test_count_and_data_queries_share_predicates() {
        let cases = [
            params(|_| {}),
            params(|p| p.keyword = Some("developer".into())),
            params(|p| {
                p.keyword = Some("rust".into());
                p.location = Some("Berlin".into());
                p.category = Some("technology".into());
                p.job_type = Some("full_time".into());
                p.featured = Some(true);
                p.sort = Some("salary".into());
                p.page = Some(3);
            }),
            params(|p| p.featured = Some(false)),
        ];
        for p in &cases {
            let data = build_search_query(p);
            let count = build_count_query(p);
            assert_eq!(
                predicates(data.sql()),
                predicates(count.sql()),
                "count must apply the same predicate set as the data query"
            );
        }
    }

    #[test]
    fn test_base_predicate_restricts_to_open_listings() {
        let sql = build_count_query(&params(|_| {})).sql().to_string();
        assert!(sql.contains("j.status = 'active'"));
        assert!(sql.contains("j.expires_at IS NULL OR j.expires_at > now()"));
    }

    #[test]
    fn test_keyword_expands_to_title_or_description() {
        let qb = build_search_query(&params(|p| p.keyword = Some("developer".into())));
        let sql = qb.sql();
        assert!(sql.contains("j.title ILIKE "));
        assert!(sql.contains(" OR j.description ILIKE "));
    }

    #[test]
    fn test_unknown_category_appends_no_predicate() {
        let qb = build_count_query(&params(|p| p.category = Some("aerospace".into())));
        assert!(!qb.sql().contains("j.category"));
    }

    #[test]
    fn test_unknown_job_type_appends_no_predicate() {
        let qb = build_count_query(&params(|p| p.job_type = Some("gig".into())));
        assert!(!qb.sql().contains("j.job_type"));
    }

    #[test]
    fn test_featured_false_appends_no_predicate() {
        // featured=true restricts; featured=false means "no filter", not
        // "only non-featured".
        let qb = build_count_query(&params(|p| p.featured = Some(false)));
        assert!(!qb.sql().contains("j.featured = TRUE"));
    }

    #[test]
    fn test_blank_filters_are_ignored() {
        let p = params(|p| {
            p.keyword = Some("   ".into());
            p.location = Some("".into());
        });
        assert_eq!(
            build_count_query(&p).sql(),
            build_count_query(&SearchParams::default()).sql()
        );
    }

    #[test]
    fn test_salary_sort_three_key_tiebreak() {
        assert_eq!(
            SortKey::Salary.order_by(),
            "j.salary_max DESC NULLS LAST, j.salary_min DESC NULLS LAST, j.featured DESC"
        );
    }

    #[test]
    fn test_deadline_sort_ascending_then_featured() {
        assert_eq!(
            SortKey::Deadline.order_by(),
            "j.expires_at ASC NULLS LAST, j.featured DESC"
        );
    }

    #[test]
    fn test_oldest_sort() {
        assert_eq!(SortKey::Oldest.order_by(), "j.created_at ASC, j.featured DESC");
    }

    #[test]
    fn test_newest_is_default_and_featured_first() {
        assert_eq!(SortKey::parse(None), SortKey::Newest);
        assert_eq!(SortKey::parse(Some("trending")), SortKey::Newest);
        assert_eq!(
            SortKey::Newest.order_by(),
            "j.featured DESC, j.created_at DESC"
        );
    }

    #[test]
    fn test_sort_applies_to_data_query_only() {
        let p = params(|p| p.sort = Some("salary".into()));
        assert!(build_search_query(&p).sql().contains("ORDER BY"));
        assert!(!build_count_query(&p).sql().contains("ORDER BY"));
        assert!(!build_count_query(&p).sql().contains("LIMIT"));
    }

    #[test]
    fn test_pagination_math_25_rows() {
        assert_eq!(total_pages(25), 3);
        assert_eq!(offset_for_page(1), 0);
        assert_eq!(offset_for_page(3), 20);
        // Page 4 of 25 rows: offset 30, past the data — empty set, no error.
        assert_eq!(offset_for_page(4), 30);
    }

    #[test]
    fn test_pagination_math_boundaries() {
        assert_eq!(total_pages(0), 1, "zero matches still renders one page");
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
    }

    #[test]
    fn test_page_clamped_at_both_ends() {
        assert_eq!(params(|p| p.page = Some(0)).page(), 1);
        assert_eq!(params(|p| p.page = Some(-5)).page(), 1);
        assert_eq!(params(|p| p.page = Some(99)).page(), 99);
        assert_eq!(params(|_| {}).page(), 1);
        assert_eq!(params(|p| p.page = Some(i64::MAX)).page(), MAX_PAGE);
        assert_eq!(params(|p| p.page = Some(i64::MIN)).page(), 1);
    }

    #[test]
    fn test_offset_never_overflows() {
        assert_eq!(offset_for_page(i64::MAX), i64::MAX);
        assert_eq!(offset_for_page(i64::MIN), i64::MIN);
        assert_eq!(offset_for_page(MAX_PAGE), (MAX_PAGE - 1) * PAGE_SIZE);
    }

    #[test]
    fn test_employer_label_coalesces_company_then_name() {
        let sql = build_search_query(&params(|_| {})).sql().to_string();
        assert!(sql.contains("COALESCE(NULLIF(u.company_name, ''), u.name) AS employer_label"));
    }

    #[test]
    fn test_query_params_parse_leniently() {
        // Query-string values are all text on the wire; unparsable ones read
        // as absent rather than failing the whole request.
        let p: SearchParams =
            serde_json::from_str(r#"{"page":"abc","featured":"1","keyword":"rust"}"#)
                .expect("lenient fields never fail deserialization");
        assert_eq!(p.page, None);
        assert_eq!(p.featured, Some(true));
        assert_eq!(p.keyword.as_deref(), Some("rust"));

        let p: SearchParams = serde_json::from_str(r#"{"page":"3","featured":"banana"}"#).unwrap();
        assert_eq!(p.page, Some(3));
        assert_eq!(p.featured, None);
    }

    #[test]
    fn test_degraded_page_shape() {
        let page = SearchPage::empty(2);
        assert!(page.jobs.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 2);
    }
}
