//! DNS query filtering module.
//!
//! Answers queries locally, before the cache or any upstream is consulted:
//! blocklisted names get `NXDOMAIN`, names with a custom record get that
//! record.

mod blocklist;
mod local;

pub use blocklist::Blocklist;
pub use local::LocalRecords;

use crate::dns::{Message, ResponseCode};
use crate::error::WireError;

/// Check if a query should be blocked and return the `NXDOMAIN` reply.
///
/// Returns `None` if the query should continue through the pipeline.
pub fn filter_query(blocklist: &Blocklist, request: &Message) -> Option<Message> {
    let question = request.questions.first()?;

    if !blocklist.is_blocked(&question.name) {
        return None;
    }

    let mut response = Message::response_to(request);
    response.header.rcode = ResponseCode::NxDomain;
    Some(response)
}

/// Build the single-answer reply for a query covered by a custom record.
pub fn local_answer(
    records: &LocalRecords,
    request: &Message,
) -> Option<Result<Message, WireError>> {
    let question = request.questions.first()?;
    let answer = records.answer(question)?;

    Some(answer.map(|record| {
        let mut response = Message::response_to(request);
        response.answers.push(record);
        response
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CustomRecord;
    use crate::dns::{Question, RecordType};

    #[test]
    fn blocked_query_gets_nxdomain_with_same_id() {
        let blocklist = Blocklist::new(["ads."]);
        let request = Message::query(77, Question::new("ads.example.com", RecordType::A));

        let response = filter_query(&blocklist, &request).unwrap();

        assert_eq!(response.header.id, 77);
        assert_eq!(response.header.rcode, ResponseCode::NxDomain);
        assert!(response.answers.is_empty());
    }

    #[test]
    fn unblocked_query_passes() {
        let blocklist = Blocklist::new(["ads."]);
        let request = Message::query(77, Question::new("example.com", RecordType::A));

        assert!(filter_query(&blocklist, &request).is_none());
    }

    #[test]
    fn unsupported_custom_type_is_an_error() {
        let records = LocalRecords::new(vec![CustomRecord {
            name: "mail.pns".to_string(),
            record_type: "MX".to_string(),
            ttl: 300,
            address: "mx.pns".to_string(),
        }]);
        let request = Message::query(1, Question::new("mail.pns", RecordType::Mx));

        let result = local_answer(&records, &request).unwrap();

        assert!(matches!(result, Err(WireError::UnsupportedRecordType(_))));
    }
}
