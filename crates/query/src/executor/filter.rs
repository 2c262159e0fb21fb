//! Filter stage.

use crate::predicate::Predicate;
use glaze_core::Record;

/// Keeps the records matching `predicate`; keeps everything when it is `None`.
pub fn filter(records: impl IntoIterator<Item = Record>, predicate: Option<&Predicate>) -> Vec<Record> {
    match predicate {
        Some(pred) => records.into_iter().filter(|r| pred.eval(r)).collect(),
        None => records.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Condition;
    use glaze_core::schema::EntitySchema;
    use glaze_core::DataType;
    use std::sync::Arc;

    fn records() -> Vec<Record> {
        let schema = Arc::new(
            EntitySchema::builder("Item")
                .field("qty", DataType::Int64)
                .build()
                .unwrap(),
        );
        (1..=5)
            .map(|i| Record::new(schema.clone(), i).with("qty", i as i64 * 10).unwrap())
            .collect()
    }

    #[test]
    fn test_filter_none_keeps_all() {
        assert_eq!(filter(records(), None).len(), 5);
    }

    #[test]
    fn test_filter_predicate() {
        let pred = Predicate::field("qty", Condition::gt(25));
        let ids: Vec<u64> = filter(records(), Some(&pred)).iter().map(Record::id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }
}
