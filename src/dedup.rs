//! Style deduplication.
//!
//! Values held by a strict majority of styled records become document-wide
//! defaults; every distinct record then gets a class holding only what
//! differs from those defaults. A class may reset a property the defaults
//! carry, so `defaults` overlaid with a class always reproduces its record.

use std::collections::HashMap;

use crate::types::{PropertyValue, StyleProperty, StyleRecord};

/// A property a class changes relative to the defaults. `None` resets the
/// property to unset.
pub type Override = (StyleProperty, Option<PropertyValue>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleClass {
    /// 1-based, in first-seen order.
    pub id: usize,
    pub name: String,
    pub record: StyleRecord,
    pub overrides: Vec<Override>,
}

/// Deduplicated style sheet for one rendered document.
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    defaults: StyleRecord,
    classes: Vec<StyleClass>,
    /// Record -> index into `classes`; `None` for records equal to the defaults.
    index: HashMap<StyleRecord, Option<usize>>,
}

impl StyleTable {
    /// Build from every record in the document, in render order. Empty
    /// records count as unstyled and do not vote for defaults.
    pub fn build<'a, I>(records: I, prefix: &str) -> Self
    where
        I: IntoIterator<Item = &'a StyleRecord>,
    {
        let records: Vec<&StyleRecord> = records.into_iter().collect();
        let defaults = majority_defaults(&records);

        let mut classes: Vec<StyleClass> = Vec::new();
        let mut index: HashMap<StyleRecord, Option<usize>> = HashMap::new();

        for record in records {
            if index.contains_key(record) {
                continue;
            }
            let overrides = diff(&defaults, record);
            let slot = if overrides.is_empty() {
                None
            } else {
                let id = classes.len() + 1;
                classes.push(StyleClass {
                    id,
                    name: format!("{prefix}{id}"),
                    record: record.clone(),
                    overrides,
                });
                Some(classes.len() - 1)
            };
            index.insert(record.clone(), slot);
        }

        log::debug!(
            "{prefix}: {} distinct styles, {} classes",
            index.len(),
            classes.len()
        );

        Self {
            defaults,
            classes,
            index,
        }
    }

    pub fn defaults(&self) -> &StyleRecord {
        &self.defaults
    }

    pub fn classes(&self) -> &[StyleClass] {
        &self.classes
    }

    pub fn class_for(&self, record: &StyleRecord) -> Option<&StyleClass> {
        let idx = (*self.index.get(record)?)?;
        self.classes.get(idx)
    }

    pub fn class_name(&self, record: &StyleRecord) -> Option<&str> {
        self.class_for(record).map(|c| c.name.as_str())
    }

    /// Effective style of a record as emitted: defaults, then its class.
    pub fn reconstruct(&self, record: &StyleRecord) -> StyleRecord {
        let mut style = self.defaults.clone();
        if let Some(class) = self.class_for(record) {
            for (property, value) in &class.overrides {
                style.set(*property, value.clone());
            }
        }
        style
    }
}

/// Per property, the value held by more than half of the styled records.
fn majority_defaults(records: &[&StyleRecord]) -> StyleRecord {
    let styled: Vec<&StyleRecord> = records.iter().copied().filter(|r| !r.is_empty()).collect();
    let mut defaults = StyleRecord::default();
    if styled.is_empty() {
        return defaults;
    }

    for property in StyleProperty::ALL {
        let mut counts: HashMap<PropertyValue, usize> = HashMap::new();
        for record in &styled {
            if let Some(value) = record.get(property) {
                *counts.entry(value).or_insert(0) += 1;
            }
        }
        let winner = counts
            .into_iter()
            .find(|(_, count)| count.saturating_mul(2) > styled.len())
            .map(|(value, _)| value);
        defaults.set(property, winner);
    }

    defaults
}

fn diff(defaults: &StyleRecord, record: &StyleRecord) -> Vec<Override> {
    StyleProperty::ALL
        .iter()
        .filter_map(|property| {
            let value = record.get(*property);
            (value != defaults.get(*property)).then_some((*property, value))
        })
        .collect()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::types::{HAlign, Pt};

    fn record(family: &str, size: f64) -> StyleRecord {
        StyleRecord {
            font_family: Some(family.to_string()),
            font_size: Some(Pt(size)),
            ..StyleRecord::default()
        }
    }

    #[test]
    fn test_sixty_percent_becomes_default() {
        let calibri = record("Calibri", 11.0);
        let arial = record("Arial", 11.0);
        let records = vec![
            calibri.clone(),
            calibri.clone(),
            calibri.clone(),
            arial.clone(),
            arial.clone(),
        ];
        let table = StyleTable::build(&records, "cellstyle");
        assert_eq!(table.defaults().font_family.as_deref(), Some("Calibri"));
        assert_eq!(table.defaults().font_size, Some(Pt(11.0)));

        // Calibri cells need no class at all.
        assert!(table.class_for(&calibri).is_none());
        let class = table.class_for(&arial).unwrap();
        assert_eq!(class.name, "cellstyle1");
        assert_eq!(
            class.overrides,
            vec![(
                StyleProperty::FontFamily,
                Some(PropertyValue::Text("Arial".to_string()))
            )]
        );
    }

    #[test]
    fn test_exact_half_is_not_a_majority() {
        let records = vec![record("Calibri", 11.0), record("Arial", 11.0)];
        let table = StyleTable::build(&records, "c");
        assert_eq!(table.defaults().font_family, None);
        assert_eq!(table.defaults().font_size, Some(Pt(11.0)));
        assert_eq!(table.classes().len(), 2);
    }

    #[test]
    fn test_round_trip_with_resets() {
        let records = vec![
            StyleRecord {
                horizontal_align: Some(HAlign::Center),
                ..record("Calibri", 11.0)
            },
            StyleRecord {
                horizontal_align: Some(HAlign::Center),
                ..record("Calibri", 11.0)
            },
            StyleRecord {
                font_size: None,
                ..record("Calibri", 11.0)
            },
            StyleRecord::default(),
        ];
        let table = StyleTable::build(&records, "c");
        for r in &records {
            assert_eq!(&table.reconstruct(r), r);
        }
        let reset = table.class_for(&records[2]).unwrap();
        assert!(reset.overrides.contains(&(StyleProperty::FontSize, None)));
        assert!(reset.overrides.contains(&(StyleProperty::HorizontalAlign, None)));
    }

    #[test]
    fn test_idempotent_and_first_seen_order() {
        let records = vec![
            record("B", 10.0),
            record("A", 12.0),
            record("B", 10.0),
            record("C", 14.0),
        ];
        let first = StyleTable::build(&records, "c");
        let second = StyleTable::build(&records, "c");
        assert_eq!(first.defaults(), second.defaults());
        assert_eq!(first.classes(), second.classes());
        let names: Vec<&str> = first.classes().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["c1", "c2", "c3"]);
        assert_eq!(first.class_name(&records[1]), Some("c2"));
    }

    #[test]
    fn test_empty_input() {
        let table = StyleTable::build(std::iter::empty(), "c");
        assert!(table.defaults().is_empty());
        assert!(table.classes().is_empty());
    }
}
