//! Statically configured answers ("custom records").

use crate::config::CustomRecord;
use crate::dns::{Question, ResourceRecord};
use crate::error::WireError;

/// Custom records indexed for lookup by question.
pub struct LocalRecords {
    records: Vec<CustomRecord>,
}

impl LocalRecords {
    pub fn new(records: Vec<CustomRecord>) -> Self {
        Self { records }
    }

    /// Find the record matching `question`: name compared case-insensitively,
    /// type compared by exact mnemonic.
    pub fn find(&self, question: &Question) -> Option<&CustomRecord> {
        let qtype = question.qtype.to_string();
        self.records.iter().find(|record| {
            record.name.eq_ignore_ascii_case(&question.name) && record.record_type == qtype
        })
    }

    /// The answer for `question`, if a custom record covers it.
    pub fn answer(&self, question: &Question) -> Option<Result<ResourceRecord, WireError>> {
        let record = self.find(question)?;
        Some(record.rdata().map(|data| ResourceRecord {
            name: question.name.clone(),
            class: question.class,
            ttl: record.ttl,
            data,
        }))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
