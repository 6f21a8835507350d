use chrono::{DateTime, Utc};
use corpbank_domain::{signer::format_timestamp, TrxDirection};
use reqwest::Url;
use uuid::Uuid;

/// Filters and paging for list endpoints. Each variant owns the query parameters it
/// writes; options are applied in the order they are given, so a later option wins
/// over an earlier one that sets the same parameter.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RequestOption {
    /// `pageNum`
    PageNum(u32),
    /// `pageSize`
    PageSize(u32),
    /// `startDate` and `endDate`, RFC3339
    DateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// `direction`
    Direction(TrxDirection),
    /// One `account` parameter per id, appended to any already present.
    AccountIds(Vec<Uuid>),
}

impl RequestOption {
    pub fn incoming() -> Self {
        RequestOption::Direction(TrxDirection::Incoming)
    }

    pub fn outgoing() -> Self {
        RequestOption::Direction(TrxDirection::Outgoing)
    }

    pub fn apply(&self, url: &mut Url) {
        match self {
            RequestOption::PageNum(page_num) => set_query(url, "pageNum", &page_num.to_string()),
            RequestOption::PageSize(page_size) => {
                set_query(url, "pageSize", &page_size.to_string())
            }
            RequestOption::DateRange { start, end } => {
                set_query(url, "startDate", &format_timestamp(start));
                set_query(url, "endDate", &format_timestamp(end));
            }
            RequestOption::Direction(direction) => {
                set_query(url, "direction", &direction.to_string())
            }
            RequestOption::AccountIds(account_ids) => {
                if account_ids.is_empty() {
                    return;
                }
                let mut pairs = url.query_pairs_mut();
                for account_id in account_ids {
                    pairs.append_pair("account", &account_id.to_string());
                }
            }
        }
    }
}

fn set_query(url: &mut Url, key: &str, value: &str) {
    let retained = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect::<Vec<_>>();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(key, value);
}
