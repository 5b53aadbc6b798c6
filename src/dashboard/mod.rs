//! Dashboard request handlers
//!
//! One handler per menu entry. A [`Request`] names a view and carries its
//! parameters; [`Dashboard::handle`] runs exactly one engine query for it
//! and wraps the answer in a [`Response`] for the presentation layer.

use crate::error::{QueryError, Result};
use crate::execution::{QueryEngine, QueryResult, SharedTable, TitleRecord};
use crate::physical::{Constraint, CorrelationMatrix, RuntimeBucket};
use crate::schema;
use arrow::array::AsArray;
use arrow::compute::cast;
use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Selectable dashboard views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Overview,
    ByReleaseYear,
    ByRuntime,
    CertificationScores,
    TopRated,
    VotesByType,
    TitleInfo,
    Correlation,
}

impl View {
    /// Menu order
    pub const ALL: [View; 8] = [
        View::Overview,
        View::ByReleaseYear,
        View::ByRuntime,
        View::CertificationScores,
        View::TopRated,
        View::VotesByType,
        View::TitleInfo,
        View::Correlation,
    ];

    /// Short identifier, as used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::ByReleaseYear => "by-release-year",
            View::ByRuntime => "by-runtime",
            View::CertificationScores => "certification-scores",
            View::TopRated => "top-rated",
            View::VotesByType => "votes-by-type",
            View::TitleInfo => "title-info",
            View::Correlation => "correlation",
        }
    }

    /// Heading shown above the view
    pub fn title(&self) -> &'static str {
        match self {
            View::Overview => "Overview of IMDB scores for Netflix titles",
            View::ByReleaseYear => "Titles by release year",
            View::ByRuntime => "Titles by runtime",
            View::CertificationScores => "Mean IMDB score by age certification",
            View::TopRated => "Top rated titles by IMDB score",
            View::VotesByType => "Mean IMDB votes by type",
            View::TitleInfo => "Title information",
            View::Correlation => "Correlation between numeric columns",
        }
    }

    /// Columns the view cannot be rendered without
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            View::Overview | View::Correlation => &[],
            View::ByReleaseYear => &[schema::TYPE, schema::RELEASE_YEAR, schema::AGE_CERTIFICATION],
            View::ByRuntime => &[schema::RUNTIME],
            View::CertificationScores => &[schema::AGE_CERTIFICATION, schema::IMDB_SCORE],
            View::TopRated => &[schema::TITLE, schema::IMDB_SCORE],
            View::VotesByType => &[schema::TYPE, schema::IMDB_VOTES],
            View::TitleInfo => &[schema::TITLE],
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        View::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QueryError::InvalidArgument(format!("unknown view: {}", s)))
    }
}

/// A view together with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "kebab-case")]
pub enum Request {
    Overview {
        rows: usize,
    },
    ByReleaseYear {
        #[serde(rename = "type")]
        kind: String,
        release_year: i64,
        age_certification: String,
    },
    ByRuntime {
        bucket: RuntimeBucket,
    },
    CertificationScores,
    TopRated {
        n: usize,
    },
    VotesByType,
    TitleInfo {
        title: String,
    },
    Correlation,
}

impl Request {
    /// Parse a request such as `{"view": "top-rated", "n": 5}`
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| QueryError::InvalidArgument(format!("invalid request: {}", e)))
    }

    pub fn view(&self) -> View {
        match self {
            Request::Overview { .. } => View::Overview,
            Request::ByReleaseYear { .. } => View::ByReleaseYear,
            Request::ByRuntime { .. } => View::ByRuntime,
            Request::CertificationScores => View::CertificationScores,
            Request::TopRated { .. } => View::TopRated,
            Request::VotesByType => View::VotesByType,
            Request::TitleInfo { .. } => View::TitleInfo,
            Request::Correlation => View::Correlation,
        }
    }
}

/// What a view renders
#[derive(Debug, Clone)]
pub enum Response {
    /// A single result table
    Table { caption: String, result: QueryResult },
    /// Leading rows plus summary statistics
    Summary { head: QueryResult, stats: QueryResult },
    /// One title; `None` when nothing matched
    Record { caption: String, record: Option<TitleRecord> },
    /// Correlation coefficients
    Matrix(CorrelationMatrix),
    /// The view could not be rendered against this table
    Warning(String),
}

impl Response {
    pub fn is_warning(&self) -> bool {
        matches!(self, Response::Warning(_))
    }
}

/// Request dispatcher over one query engine
#[derive(Debug, Clone)]
pub struct Dashboard {
    engine: QueryEngine,
}

impl Dashboard {
    pub fn new(engine: QueryEngine) -> Self {
        Self { engine }
    }

    /// Build over a lazily loaded table, loading it if needed
    pub fn from_shared(table: &SharedTable) -> Result<Self> {
        Ok(Self::new(QueryEngine::new(table.get()?)))
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Values offered by a selector over `column`, in first-seen order
    pub fn options(&self, column: &str) -> Result<Vec<String>> {
        let result = self.engine.distinct_values(column)?;
        let values = cast(result.batch.column(0), &DataType::Utf8)?;
        Ok(values
            .as_string::<i32>()
            .iter()
            .flatten()
            .map(str::to_string)
            .collect())
    }

    pub fn handle(&self, request: &Request) -> Result<Response> {
        let view = request.view();
        let missing: Vec<&str> = view
            .required_columns()
            .iter()
            .copied()
            .filter(|c| !self.engine.table().has_column(c))
            .collect();
        if !missing.is_empty() {
            warn!(%view, missing = ?missing, "required columns absent");
            return Ok(Response::Warning(format!(
                "The required columns are not present in the data set: {}",
                missing.join(", ")
            )));
        }

        debug!(%view, "handling request");
        match request {
            Request::Overview { rows } => Ok(Response::Summary {
                head: self.engine.head(*rows)?,
                stats: self.engine.describe()?,
            }),
            Request::ByReleaseYear {
                kind,
                release_year,
                age_certification,
            } => {
                let result = self.engine.filter_eq(&[
                    Constraint::new(schema::TYPE, kind.as_str()),
                    Constraint::new(schema::RELEASE_YEAR, *release_year),
                    Constraint::new(schema::AGE_CERTIFICATION, age_certification.as_str()),
                ])?;
                Ok(Response::Table {
                    caption: format!("{} {} titles rated {}", release_year, kind, age_certification),
                    result,
                })
            }
            Request::ByRuntime { bucket } => Ok(Response::Table {
                caption: bucket.label().to_string(),
                result: self.engine.filter_runtime(*bucket)?,
            }),
            Request::CertificationScores => Ok(Response::Table {
                caption: view.title().to_string(),
                result: self
                    .engine
                    .group_mean(schema::AGE_CERTIFICATION, schema::IMDB_SCORE)?,
            }),
            Request::TopRated { n } => Ok(Response::Table {
                caption: format!("Top {} titles by IMDB score", n),
                result: self.engine.top_n(schema::IMDB_SCORE, *n)?,
            }),
            Request::VotesByType => Ok(Response::Table {
                caption: view.title().to_string(),
                result: self.engine.group_mean(schema::TYPE, schema::IMDB_VOTES)?,
            }),
            Request::TitleInfo { title } => Ok(Response::Record {
                caption: title.clone(),
                record: self.engine.title_info(title)?,
            }),
            Request::Correlation => Ok(Response::Matrix(self.engine.correlation()?)),
        }
    }
}
