//! Fixture generation
//!
//! Builds entity-shaped records from an index and a kind selector. Records
//! are index-deterministic so a scenario can regenerate the exact payload
//! it published when it later verifies stored state.
//!
//! Validity modes cover the pipeline's negative paths: a record can omit
//! its identifier field entirely, or a batch can alternate valid/invalid
//! shape by index parity.

use serde_json::{json, Value};

/// Entity kinds the pipeline consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Claimant,
    Contract,
    Statement,
}

impl EntityKind {
    /// All kinds, in topic declaration order
    pub fn all() -> [EntityKind; 3] {
        [
            EntityKind::Claimant,
            EntityKind::Contract,
            EntityKind::Statement,
        ]
    }

    /// The identifier field name for this kind. Exactly one field name maps
    /// to each kind.
    pub fn id_field(&self) -> &'static str {
        match self {
            EntityKind::Claimant => "citizenId",
            EntityKind::Contract => "contractId",
            EntityKind::Statement => "statementId",
        }
    }

    /// Source database name as it appears in envelope metadata
    pub fn db(&self) -> &'static str {
        "core"
    }

    /// Source collection name as it appears in envelope metadata
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Claimant => "claimant",
            EntityKind::Contract => "contract",
            EntityKind::Statement => "statement",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection())
    }
}

/// Payload shape selector for a generated batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Well-formed records only
    Valid,
    /// Identifier field omitted from every record
    MissingId,
    /// Alternating by index parity: even indexes valid, odd indexes
    /// missing their identifier field
    Mixed,
}

/// Generate a well-formed record for `kind` at `index`.
///
/// ```
/// use claimant_harness::harness::fixtures::{self, EntityKind};
///
/// let record = fixtures::generate(EntityKind::Claimant, 7);
/// assert!(record.get(EntityKind::Claimant.id_field()).is_some());
/// ```
pub fn generate(kind: EntityKind, index: usize) -> Value {
    match kind {
        EntityKind::Claimant => {
            let id = citizen_id(index);
            json!({
                "_id": { "citizenId": id },
                "citizenId": id,
                "nino": nino(index),
            })
        }
        EntityKind::Contract => {
            let id = contract_id(index);
            json!({
                "_id": { "contractId": id },
                "contractId": id,
                "people": [citizen_id(index)],
                "contractType": "UC",
                "coupleContract": false,
                "createdDateTime": created_date_time(index),
                "startDate": 20200101 + (index as i64 % 28),
                "closedDate": null,
                "declaredDate": null,
                "entitlementDate": 20200201 + (index as i64 % 28),
            })
        }
        EntityKind::Statement => {
            let id = statement_id(index);
            json!({
                "_id": { "statementId": id },
                "statementId": id,
                "people": [
                    { "citizenId": citizen_id(index), "contractId": contract_id(index) }
                ],
                "createdDateTime": created_date_time(index),
                "assessmentPeriod": {
                    "startDate": 20200301 + (index as i64 % 28),
                    "endDate": 20200329 + (index as i64 % 28),
                },
                "takeHomePay": take_home_pay(index),
            })
        }
    }
}

/// Generate a record for `kind` at `index` under a validity mode
pub fn generate_with_validity(kind: EntityKind, index: usize, validity: Validity) -> Value {
    let malformed = match validity {
        Validity::Valid => false,
        Validity::MissingId => true,
        Validity::Mixed => index % 2 != 0,
    };
    let mut record = generate(kind, index);
    if malformed {
        if let Some(object) = record.as_object_mut() {
            object.remove(kind.id_field());
        }
    }
    record
}

/// National insurance number for a fixture index
pub fn nino(index: usize) -> String {
    format!("AA{:06}A", index % 1_000_000)
}

/// Take-home pay amount for a statement fixture index
pub fn take_home_pay(index: usize) -> String {
    format!("{}.{:02}", 900 + index, index % 100)
}

pub fn citizen_id(index: usize) -> String {
    format!("citizen-{:06}", index)
}

pub fn contract_id(index: usize) -> String {
    format!("contract-{:06}", index)
}

pub fn statement_id(index: usize) -> String {
    format!("statement-{:06}", index)
}

fn created_date_time(index: usize) -> String {
    format!("2020-03-{:02}T09:30:00.000", (index % 28) + 1)
}
