//! Cross-Table Integrity Checker (spec §4.5): resolves foreign-key
//! references across tables once every table has finished its two passes.
//!
//! There is no teacher analogue for multi-table referential integrity (the
//! teacher is single-table); this module is grounded on spec §4.5's
//! algorithm directly, reusing the accumulator sets `pipeline.rs` already
//! builds per `ForeignKeyDefinition`/`ReferencedForeignKey`.

use crate::error::{ReportEntry, categories, kinds};
use crate::model::{ReferencedForeignKey, TableGroup};
use crate::pipeline::TableAccumulator;

/// Checks every `ForeignKeyDefinition` across `group` against its resolved
/// target's accumulated parent key set, appending `unmatched_foreign_key_
/// reference` / `multiple_matched_rows` errors onto the owning table's
/// accumulator (spec §4.5).
pub fn check_group(group: &TableGroup, accumulators: &mut [TableAccumulator]) {
    for table_idx in 0..group.tables.len() {
        let Some(schema) = group.tables[table_idx].schema.as_ref() else {
            continue;
        };

        for fk_idx in 0..schema.foreign_keys.len() {
            let fk = &schema.foreign_keys[fk_idx];
            let Some(target_idx) = group.table_index_by_url(&fk.resource_url) else {
                continue;
            };
            let Some(target_schema) = group.tables[target_idx].schema.as_ref() else {
                continue;
            };

            let target_columns: Vec<usize> = fk
                .referenced_columns
                .iter()
                .filter_map(|name| target_schema.column_index_by_name(name))
                .collect();
            if target_columns.len() != fk.referenced_columns.len() {
                continue;
            }
            let source_local_columns: Vec<String> = fk
                .local_columns
                .iter()
                .filter_map(|&idx| schema.columns.get(idx).and_then(|c| c.name.clone()))
                .collect();
            let expected = ReferencedForeignKey {
                source_table_url: group.tables[table_idx].url.clone(),
                source_local_columns,
                target_columns,
            };
            let Some(rfk_idx) = group.tables[target_idx]
                .referenced_foreign_keys
                .iter()
                .position(|rfk| rfk == &expected)
            else {
                continue;
            };

            let mut new_errors = Vec::new();
            {
                let child_set = &accumulators[table_idx].child_foreign_keys[fk_idx];
                let parent_set = &accumulators[target_idx].parent_foreign_key_references[rfk_idx];

                for child in child_set {
                    if child.key.is_empty_reference() {
                        continue;
                    }
                    match parent_set.get(child) {
                        Some(found) if found.is_duplicate => {
                            new_errors.push(ReportEntry::new(
                                kinds::MULTIPLE_MATCHED_ROWS,
                                categories::STRUCTURE,
                                child.record_number.to_string(),
                                String::new(),
                                format!(
                                    "multiple rows match foreign key - {}",
                                    child.key.joined_display()
                                ),
                            ));
                        }
                        Some(_) => {}
                        None => {
                            new_errors.push(ReportEntry::new(
                                kinds::UNMATCHED_FOREIGN_KEY_REFERENCE,
                                categories::STRUCTURE,
                                child.record_number.to_string(),
                                String::new(),
                                format!(
                                    "no matching row for foreign key - {}",
                                    child.key.joined_display()
                                ),
                            ));
                        }
                    }
                }
            }
            accumulators[table_idx].errors.extend(new_errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::datatypes::registry::Datatype;
    use crate::dialect::Dialect;
    use crate::model::{ForeignKeyDefinition, Table, TableSchema};
    use crate::row::{KeyValue, KeyValueWithContext};

    fn make_group() -> TableGroup {
        let mut parent = Table::new("parent.csv");
        let mut parent_schema = TableSchema::default();
        let mut id_col = Column::new(1, Datatype::String);
        id_col.name = Some("id".to_string());
        parent_schema.columns.push(id_col);
        parent.schema = Some(parent_schema);

        let mut child = Table::new("child.csv");
        let mut child_schema = TableSchema::default();
        let mut fk_col = Column::new(1, Datatype::String);
        fk_col.name = Some("parent_id".to_string());
        child_schema.columns.push(fk_col);
        child_schema.foreign_keys.push(ForeignKeyDefinition {
            local_columns: vec![0],
            resource_url: "parent.csv".to_string(),
            referenced_columns: vec!["id".to_string()],
        });
        child.schema = Some(child_schema);

        let mut group = TableGroup {
            tables: vec![parent, child],
            dialect: Dialect::default(),
        };
        group.resolve_referenced_foreign_keys();
        group
    }

    fn key(value: &str) -> KeyValue {
        KeyValue {
            canonical: vec![value.to_string()],
            display: vec![value.to_string()],
        }
    }

    #[test]
    fn unmatched_reference_is_reported_on_child_table() {
        let group = make_group();
        let mut parent_acc = TableAccumulator::default();
        parent_acc.parent_foreign_key_references = vec![Default::default()];

        let mut child_acc = TableAccumulator::default();
        child_acc.child_foreign_keys = vec![Default::default()];
        child_acc.child_foreign_keys[0].insert(KeyValueWithContext {
            key: key("missing"),
            record_number: 3,
            is_duplicate: false,
        });

        let mut accumulators = vec![parent_acc, child_acc];
        check_group(&group, &mut accumulators);
        assert_eq!(accumulators[1].errors.len(), 1);
        assert_eq!(accumulators[1].errors[0].kind, kinds::UNMATCHED_FOREIGN_KEY_REFERENCE);
        assert_eq!(accumulators[1].errors[0].row, "3");
    }

    #[test]
    fn multiple_matched_rows_is_reported() {
        let group = make_group();
        let mut parent_acc = TableAccumulator::default();
        parent_acc.parent_foreign_key_references = vec![Default::default()];
        parent_acc.parent_foreign_key_references[0].insert(KeyValueWithContext {
            key: key("W1"),
            record_number: 2,
            is_duplicate: true,
        });

        let mut child_acc = TableAccumulator::default();
        child_acc.child_foreign_keys = vec![Default::default()];
        child_acc.child_foreign_keys[0].insert(KeyValueWithContext {
            key: key("W1"),
            record_number: 5,
            is_duplicate: false,
        });

        let mut accumulators = vec![parent_acc, child_acc];
        check_group(&group, &mut accumulators);
        assert_eq!(accumulators[1].errors.len(), 1);
        assert_eq!(accumulators[1].errors[0].kind, kinds::MULTIPLE_MATCHED_ROWS);
        assert_eq!(accumulators[1].errors[0].row, "5");
    }

    #[test]
    fn empty_component_keys_are_ignored() {
        let group = make_group();
        let mut parent_acc = TableAccumulator::default();
        parent_acc.parent_foreign_key_references = vec![Default::default()];
        let mut child_acc = TableAccumulator::default();
        child_acc.child_foreign_keys = vec![Default::default()];
        child_acc.child_foreign_keys[0].insert(KeyValueWithContext {
            key: key(""),
            record_number: 7,
            is_duplicate: false,
        });

        let mut accumulators = vec![parent_acc, child_acc];
        check_group(&group, &mut accumulators);
        assert!(accumulators[1].errors.is_empty());
    }
}
