//! Listing and searching over the full transaction history.

use crate::error::{GatewayError, Result};
use crate::literal;
use crate::path::{lookup, Lookup, Step};
use crate::record::{self, ExternalRecord, LedgerTransaction};
use crate::wire::blank_as_none;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const ELECTION_ID_KEY: &str = "currentElectionId";

/// Owner/recipient constraints. `None` leaves the field unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub owner_public_key: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub recipient_public_key: Option<String>,
}

impl FilterCriteria {
    /// Build criteria; blank keys mean "no filter". Other keys are kept as given.
    pub fn new(owner: Option<&str>, recipient: Option<&str>) -> Self {
        let clean = |k: Option<&str>| k.filter(|k| !k.trim().is_empty()).map(str::to_string);
        Self {
            owner_public_key: clean(owner),
            recipient_public_key: clean(recipient),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.owner_public_key.is_none() && self.recipient_public_key.is_none()
    }

    pub fn matches(&self, tx: &LedgerTransaction) -> bool {
        let owner_ok = match &self.owner_public_key {
            Some(owner) => tx.owner() == Some(owner.as_str()),
            None => true,
        };
        let recipient_ok = match &self.recipient_public_key {
            Some(recipient) => tx.recipient() == Some(recipient.as_str()),
            None => true,
        };
        owner_ok && recipient_ok
    }
}

/// Per-record result of a bulk pass
#[derive(Debug)]
pub enum Outcome {
    Keep(ExternalRecord),
    Skip { id: String, reason: String },
}

impl Outcome {
    fn skip(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Outcome::Skip {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Record-local errors become skips; anything else aborts the listing.
fn classify(id: &str, result: Result<Outcome>) -> Result<Outcome> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(e) if e.is_record_local() => Ok(Outcome::skip(id, e.to_string())),
        Err(e) => Err(e),
    }
}

/// Drop skipped records, logging why
fn collapse(outcomes: Vec<Outcome>) -> Vec<ExternalRecord> {
    let mut kept = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Outcome::Keep(record) => kept.push(record),
            Outcome::Skip { id, reason } => debug!("skipping record {}: {}", id, reason),
        }
    }
    kept
}

/// Map every transaction in `history` matching `criteria`.
///
/// Transactions that cannot be mapped are dropped and logged.
pub fn by_keys(history: Vec<Value>, criteria: &FilterCriteria) -> Result<Vec<ExternalRecord>> {
    let mut outcomes = Vec::with_capacity(history.len());
    for raw in history {
        let tx = LedgerTransaction(raw);
        if !criteria.matches(&tx) {
            continue;
        }
        let id = tx.label();
        let outcome = classify(&id, record::map(&tx).map(Outcome::Keep))?;
        if let Outcome::Skip { reason, .. } = &outcome {
            warn!("dropping unmappable transaction {}: {}", id, reason);
        }
        outcomes.push(outcome);
    }
    Ok(collapse(outcomes))
}

/// Keep records whose asset `data` mapping holds every key in `required_keys`.
pub fn with_required_keys(
    records: Vec<ExternalRecord>,
    required_keys: &[String],
) -> Result<Vec<ExternalRecord>> {
    let mut outcomes = Vec::with_capacity(records.len());
    for record in records {
        let id = record.id.clone();
        let checked = asset_data(&record).map(|data| {
            match required_keys.iter().find(|k| !data.contains_key(k.as_str())) {
                None => Outcome::Keep(record),
                Some(missing) => Outcome::skip(&id, format!("data has no '{}'", missing)),
            }
        });
        outcomes.push(classify(&id, checked)?);
    }
    Ok(collapse(outcomes))
}

/// Keep records whose `data.currentElectionId` equals `election_id`.
pub fn by_election_id(records: Vec<ExternalRecord>, election_id: &str) -> Result<Vec<ExternalRecord>> {
    let mut outcomes = Vec::with_capacity(records.len());
    for record in records {
        let id = record.id.clone();
        let checked = parse_asset(&record).map(|asset| {
            match lookup(&asset, &[Step::Key("data"), Step::Key(ELECTION_ID_KEY)]) {
                Lookup::Found(Value::String(found)) if found == election_id => {
                    Outcome::Keep(record)
                }
                Lookup::Found(other) => {
                    Outcome::skip(&id, format!("{} is {}", ELECTION_ID_KEY, other))
                }
                Lookup::Missing(at) => Outcome::skip(&id, format!("asset has no {}", at)),
            }
        });
        outcomes.push(classify(&id, checked)?);
    }
    Ok(collapse(outcomes))
}

fn parse_asset(record: &ExternalRecord) -> Result<Value> {
    literal::parse(&record.asset).map_err(|e| GatewayError::InvalidAssetPayload(e.to_string()))
}

/// The asset's `data` mapping; anything else is a record-local error
fn asset_data(record: &ExternalRecord) -> Result<Map<String, Value>> {
    let asset = parse_asset(record)?;
    match lookup(&asset, &[Step::Key("data")]) {
        Lookup::Found(Value::Object(data)) => Ok(data.clone()),
        Lookup::Found(_) => Err(GatewayError::InvalidAssetPayload(
            "'data' is not a mapping".into(),
        )),
        Lookup::Missing(_) => Err(GatewayError::InvalidAssetPayload(format!(
            "'data' key missing in asset {}",
            record.asset
        ))),
    }
}
