//! Aggregate statistics over `is_used_for_stats` fields

use serde::{Deserialize, Serialize};

use crate::schema::FieldSpec;
use crate::storage::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub field_name: String,
    pub field_label: String,
    pub sum: f64,
    /// 0 when no value is numeric
    pub avg: f64,
    /// Number of values that parsed as numbers
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStats {
    pub fields: Vec<FieldStats>,
    pub total_records: usize,
}

/// Sums and averages every stats field; non-numeric values are skipped.
pub fn compute<'a>(fields: impl Iterator<Item = &'a FieldSpec>, docs: &[Document]) -> TableStats {
    let fields = fields
        .map(|field| {
            let (sum, count) = docs
                .iter()
                .filter_map(|d| d.get(&field.field_name).and_then(|v| v.as_number()))
                .fold((0.0, 0usize), |(sum, count), n| (sum + n, count + 1));
            FieldStats {
                field_name: field.field_name.clone(),
                field_label: field.label().to_string(),
                sum,
                avg: if count == 0 { 0.0 } else { sum / count as f64 },
                count,
            }
        })
        .collect();

    TableStats {
        fields,
        total_records: docs.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use crate::storage::FieldValue;
    use std::collections::BTreeMap;

    fn doc(price: FieldValue) -> Document {
        let mut fields = BTreeMap::new();
        fields.insert("price".to_string(), price);
        Document::new(fields)
    }

    #[test]
    fn test_sum_and_avg_skip_non_numeric() {
        let field = FieldSpec::new("price", FieldType::Number).with_label("Price");
        let docs = vec![
            doc(FieldValue::Number(10.0)),
            doc(FieldValue::Text("20".into())),
            doc(FieldValue::Text("n/a".into())),
            doc(FieldValue::Text("12abc".into())),
            doc(FieldValue::Null),
        ];
        let stats = compute([&field].into_iter(), &docs);
        assert_eq!(stats.total_records, 5);
        let price = &stats.fields[0];
        assert_eq!(price.field_label, "Price");
        assert_eq!(price.sum, 30.0);
        assert_eq!(price.count, 2);
        assert_eq!(price.avg, 15.0);
    }

    #[test]
    fn test_empty_table() {
        let field = FieldSpec::new("price", FieldType::Number);
        let stats = compute([&field].into_iter(), &[]);
        assert_eq!(stats.fields[0].avg, 0.0);
        assert_eq!(stats.total_records, 0);
    }
}
