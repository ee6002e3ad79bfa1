use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Data formats the client can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Format {
    #[default]
    Bam,
    Cram,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Bam => write!(f, "BAM"),
            Format::Cram => write!(f, "CRAM"),
        }
    }
}

/// Genomic region to request: reference sequence plus 1-based coordinates.
/// `0` for either coordinate means "unspecified".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(alias = "sequence")]
    pub reference_name: String,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub end: u64,
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.reference_name, self.start, self.end)
    }
}

impl FromStr for Query {
    type Err = Error;

    /// Parse `name:start-end`, e.g. `chr20:1000-2000`.
    fn from_str(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidQuery(s.to_string());

        let (name, coords) = s.split_once(':').ok_or_else(invalid)?;
        let (start, end) = coords.split_once('-').ok_or_else(invalid)?;
        if name.is_empty()
            || !start.bytes().all(|b| b.is_ascii_digit())
            || !end.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        Ok(Query {
            reference_name: name.to_string(),
            start: start.parse().map_err(|_| invalid())?,
            end: end.parse().map_err(|_| invalid())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_round_trip() {
        let query: Query = "chr20:1000-2000".parse().unwrap();
        assert_eq!(query.reference_name, "chr20");
        assert_eq!(query.start, 1000);
        assert_eq!(query.end, 2000);
        assert_eq!(query.to_string(), "chr20:1000-2000");
    }

    #[test]
    fn test_query_rejects_malformed() {
        for s in ["chr20", "chr20:10", ":10-20", "chr20:a-b", "chr20:10-"] {
            assert!(s.parse::<Query>().is_err(), "accepted {s:?}");
        }
    }

    #[test]
    fn test_format_display() {
        assert_eq!(Format::Bam.to_string(), "BAM");
        assert_eq!(Format::Cram.to_string(), "CRAM");
    }
}
