//! Inbox query builder
//!
//! Renders the Directus filter/sort/fields syntax for the notifications
//! collection. Bracketed keys are left literal and values percent-encoded.

use crate::models::RecipientId;

/// Query for the newest inbox notification of one recipient
#[derive(Debug, Clone, PartialEq)]
pub struct InboxQuery {
    recipient: RecipientId,
    status: String,
    sort: String,
    limit: u32,
}

impl InboxQuery {
    /// Fields requested for each notification
    pub const FIELDS: [&'static str; 5] = ["id", "subject", "collection", "item", "timestamp"];

    /// Newest-first, single result, `status == "inbox"`
    pub fn latest_for(recipient: RecipientId) -> Self {
        Self {
            recipient,
            status: "inbox".to_string(),
            sort: "-timestamp".to_string(),
            limit: 1,
        }
    }

    pub fn recipient(&self) -> &RecipientId {
        &self.recipient
    }

    /// Key/value pairs in request order
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("filter[_and][0][recipient][_eq]", self.recipient.to_string()),
            ("filter[_and][1][status][_eq]", self.status.clone()),
        ];
        pairs.extend(Self::FIELDS.iter().map(|f| ("fields[]", f.to_string())));
        pairs.push(("sort[]", self.sort.clone()));
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }

    /// Render as a query string without the leading `?`
    pub fn to_query_string(&self) -> String {
        self.pairs()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_matches_directus_syntax() {
        let query = InboxQuery::latest_for(RecipientId::new("8f0c-11"));

        assert_eq!(
            query.to_query_string(),
            "filter[_and][0][recipient][_eq]=8f0c-11\
             &filter[_and][1][status][_eq]=inbox\
             &fields[]=id&fields[]=subject&fields[]=collection&fields[]=item&fields[]=timestamp\
             &sort[]=-timestamp&limit=1"
        );
    }

    #[test]
    fn test_recipient_is_percent_encoded() {
        let query = InboxQuery::latest_for(RecipientId::new("a&b c"));
        assert!(
            query
                .to_query_string()
                .starts_with("filter[_and][0][recipient][_eq]=a%26b%20c&")
        );
    }
}
