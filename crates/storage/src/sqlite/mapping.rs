//! Conversions between domain identifiers and `SQLite` column types.

use std::str::FromStr;

use drill_core::model::{AnswerId, QuestionId, QuestionKind, UserId};

use crate::repository::StorageError;

pub fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    u64::try_from(v)
        .map(QuestionId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid question id: {v}")))
}

pub fn answer_id_from_i64(v: i64) -> Result<AnswerId, StorageError> {
    u64::try_from(v)
        .map(AnswerId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid answer id: {v}")))
}

pub fn kind_from_str(v: &str) -> Result<QuestionKind, StorageError> {
    QuestionKind::from_str(v).map_err(ser)
}

pub fn user_id_text(user: UserId) -> String {
    user.value().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ids_are_rejected() {
        assert!(question_id_from_i64(-1).is_err());
        assert!(answer_id_from_i64(-5).is_err());
    }

    #[test]
    fn kind_strings_round_trip() {
        assert_eq!(kind_from_str("single").unwrap(), QuestionKind::Single);
        assert_eq!(kind_from_str("multiple").unwrap(), QuestionKind::Multiple);
        assert!(kind_from_str("either").is_err());
    }
}
