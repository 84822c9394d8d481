use crate::models::catalog::{contains_phrase, KeywordTables};
use crate::models::Intent;

/// Map a free-form opening message to a flow intent. Precedence:
/// reserve > modify > cancel. `None` means the message is not ours to
/// answer and the caller should hand it to its FAQ path.
pub fn classify(message: &str, keywords: &KeywordTables) -> Option<Intent> {
    if keywords.reserve.iter().any(|k| contains_phrase(message, k)) {
        Some(Intent::Reserve)
    } else if keywords.modify.iter().any(|k| contains_phrase(message, k)) {
        Some(Intent::Modify)
    } else if keywords.cancel.iter().any(|k| contains_phrase(message, k)) {
        Some(Intent::Cancel)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords() -> KeywordTables {
        KeywordTables::default()
    }

    #[test]
    fn test_reserve_intent() {
        assert_eq!(
            classify("I'd like to book a cut", &keywords()),
            Some(Intent::Reserve)
        );
        assert_eq!(
            classify("can I make a reservation?", &keywords()),
            Some(Intent::Reserve)
        );
    }

    #[test]
    fn test_modify_intent() {
        assert_eq!(
            classify("I need to reschedule", &keywords()),
            Some(Intent::Modify)
        );
        assert_eq!(
            classify("can I change my booking", &keywords()),
            Some(Intent::Modify)
        );
    }

    #[test]
    fn test_cancel_intent() {
        assert_eq!(
            classify("please cancel my reservation", &keywords()),
            Some(Intent::Cancel)
        );
    }

    #[test]
    fn test_reserve_takes_precedence() {
        assert_eq!(
            classify("cancel that and book me again", &keywords()),
            Some(Intent::Reserve)
        );
    }

    #[test]
    fn test_unrelated_message_is_none() {
        assert_eq!(classify("what are your opening hours?", &keywords()), None);
        assert_eq!(classify("hello", &keywords()), None);
    }
}
