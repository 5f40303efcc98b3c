//! # Job Files
//!
//! A job names what to search for and where to move it.
//!
//! ```toml
//! [search]
//! series = "F001"
//! document_type = "invoice"      # optional
//! status = "problematic"         # all | problematic | accepted | suspect_duplicates | pending | sending | rejected
//! response_filter = "2033"       # optional
//!
//! [renumber]
//! target_series = "F002"
//! select = "all"                 # or ["id-1", "id-2"]
//! commit = true
//! resubmit = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use folio_core::{DocumentType, SelectionCriteria, StatusMode, ValidationError};
use folio_engine::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub search: SearchSpec,
    pub renumber: RenumberSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpec {
    pub series: String,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub response_filter: Option<String>,
}

fn default_status() -> String {
    "problematic".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenumberSpec {
    pub target_series: String,
    #[serde(default)]
    pub select: Selection,
    /// Without `commit` the job stops after logging the preview.
    #[serde(default)]
    pub commit: bool,
    #[serde(default)]
    pub resubmit: bool,
}

/// Which candidates to renumber.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSelection", into = "RawSelection")]
pub enum Selection {
    #[default]
    All,
    Ids(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawSelection {
    Keyword(String),
    Ids(Vec<String>),
}

impl TryFrom<RawSelection> for Selection {
    type Error = String;

    fn try_from(raw: RawSelection) -> Result<Self, Self::Error> {
        match raw {
            RawSelection::Keyword(k) if k.eq_ignore_ascii_case("all") => Ok(Selection::All),
            RawSelection::Keyword(k) => Err(format!("select must be \"all\" or a list of ids, got \"{}\"", k)),
            RawSelection::Ids(ids) => Ok(Selection::Ids(ids)),
        }
    }
}

impl From<Selection> for RawSelection {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::All => RawSelection::Keyword("all".to_string()),
            Selection::Ids(ids) => RawSelection::Ids(ids),
        }
    }
}

impl JobSpec {
    pub fn load(path: &Path) -> EngineResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> EngineResult<Self> {
        let job: JobSpec = toml::from_str(contents)?;
        if job.renumber.resubmit && !job.renumber.commit {
            return Err(EngineError::InvalidConfig(
                "renumber.resubmit requires renumber.commit".into(),
            ));
        }
        Ok(job)
    }

    /// Validated search criteria.
    pub fn criteria(&self) -> Result<SelectionCriteria, ValidationError> {
        let document_type = self
            .search
            .document_type
            .as_deref()
            .map(str::parse::<DocumentType>)
            .transpose()?;
        let status: StatusMode = self.search.status.parse()?;

        SelectionCriteria::new(
            &self.search.series,
            document_type,
            status,
            self.search.response_filter.as_deref(),
        )
    }
}
