//! Book search filters built from list query parameters

use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use super::book::BookStatus;
use crate::error::{AppError, AppResult};

pub const DEFAULT_LIMIT: i64 = 50;

const PUBLISH_DATE_FORMAT: &str = "%Y-%m-%d";
const PUBLISH_DATE_USAGE: &str =
    "invalid publish_date filter format, use '<eq|neq|lt|lte|gt|gte> yyyy-mm-dd'";

/// Raw query string of `GET /books`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookListParams {
    /// Substring of the title (case-sensitive)
    pub title: Option<String>,
    /// Substring of the author (case-sensitive)
    pub author: Option<String>,
    /// Substring of the publisher (case-sensitive)
    pub publisher: Option<String>,
    /// `CheckedIn` or `CheckedOut` (any case)
    pub status: Option<String>,
    /// Comparison such as `gt 2020-01-01`
    pub publish_date: Option<String>,
    /// Page size (default: 50)
    pub limit: Option<String>,
    /// Rows to skip (default: 0)
    pub offset: Option<String>,
}

/// Comparison applied to the publish date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl DateOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "eq" => Some(DateOp::Eq),
            "neq" => Some(DateOp::Neq),
            "lt" => Some(DateOp::Lt),
            "lte" => Some(DateOp::Lte),
            "gt" => Some(DateOp::Gt),
            "gte" => Some(DateOp::Gte),
            _ => None,
        }
    }

    /// SQL comparison operator
    pub fn as_sql(&self) -> &'static str {
        match self {
            DateOp::Eq => "=",
            DateOp::Neq => "<>",
            DateOp::Lt => "<",
            DateOp::Lte => "<=",
            DateOp::Gt => ">",
            DateOp::Gte => ">=",
        }
    }

    pub fn matches(&self, lhs: NaiveDate, rhs: NaiveDate) -> bool {
        match self {
            DateOp::Eq => lhs == rhs,
            DateOp::Neq => lhs != rhs,
            DateOp::Lt => lhs < rhs,
            DateOp::Lte => lhs <= rhs,
            DateOp::Gt => lhs > rhs,
            DateOp::Gte => lhs >= rhs,
        }
    }
}

/// Publish date compared at day granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    pub op: DateOp,
    pub date: NaiveDate,
}

impl std::str::FromStr for DateFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split(' ').collect();
        let [op, date] = tokens.as_slice() else {
            return Err(AppError::bad_request(PUBLISH_DATE_USAGE));
        };
        let op = DateOp::from_token(op).ok_or_else(|| AppError::bad_request(PUBLISH_DATE_USAGE))?;
        let date = NaiveDate::parse_from_str(date, PUBLISH_DATE_FORMAT)
            .map_err(|_| AppError::bad_request(PUBLISH_DATE_USAGE))?;
        Ok(DateFilter { op, date })
    }
}

/// Validated, normalized list filters; every present filter must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookSearch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub status: Option<BookStatus>,
    pub publish_date: Option<DateFilter>,
}

impl BookSearch {
    pub fn from_params(params: &BookListParams) -> AppResult<Self> {
        let status = match present(&params.status) {
            Some(label) => Some(BookStatus::from_label(label).ok_or_else(|| {
                AppError::bad_request("invalid status format, use 'checkedIn' or 'checkedOut'")
            })?),
            None => None,
        };

        let publish_date = present(&params.publish_date)
            .map(str::parse::<DateFilter>)
            .transpose()?;

        Ok(Self {
            title: present(&params.title).map(str::to_string),
            author: present(&params.author).map(str::to_string),
            publisher: present(&params.publisher).map(str::to_string),
            status,
            publish_date,
        })
    }

    pub fn is_unrestricted(&self) -> bool {
        *self == Self::default()
    }
}

/// Page window of a list query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn from_params(params: &BookListParams) -> AppResult<Self> {
        Ok(Self {
            limit: parse_count(&params.limit, "limit")?.unwrap_or(DEFAULT_LIMIT),
            offset: parse_count(&params.offset, "offset")?.unwrap_or(0),
        })
    }
}

/// Empty parameters carry no constraint.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn parse_count(value: &Option<String>, name: &str) -> AppResult<Option<i64>> {
    present(value)
        .map(|v| match v.parse::<i64>() {
            Ok(n) if n >= 0 => Ok(n),
            _ => Err(AppError::bad_request(format!("invalid {} format", name))),
        })
        .transpose()
}
