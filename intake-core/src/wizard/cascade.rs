//! Declared field dependencies.
//!
//! When a field changes, every field that depends on it (directly or
//! through another dependent) is cleared before anything else happens.

use super::form::Field;

/// `(upstream, dependents)` pairs.
pub const DEPENDENTS: &[(Field, &[Field])] = &[
    (
        Field::DocDate,
        &[Field::DocumentType, Field::SubType, Field::Circuit],
    ),
    (Field::DocumentType, &[Field::SubType, Field::Circuit]),
];

/// Direct dependents of `field`.
pub fn dependents_of(field: Field) -> &'static [Field] {
    DEPENDENTS
        .iter()
        .find(|(upstream, _)| *upstream == field)
        .map(|(_, dependents)| *dependents)
        .unwrap_or(&[])
}

/// Every field invalidated by a change to `field`, in first-reached order,
/// without duplicates and without `field` itself.
pub fn invalidation_closure(field: Field) -> Vec<Field> {
    let mut closure: Vec<Field> = Vec::new();
    let mut queue = vec![field];

    while let Some(current) = queue.pop() {
        for dependent in dependents_of(current) {
            if *dependent != field && !closure.contains(dependent) {
                closure.push(*dependent);
                queue.push(*dependent);
            }
        }
    }

    closure
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn doc_date_invalidates_type_subtype_and_circuit() {
        assert_eq!(
            invalidation_closure(Field::DocDate),
            vec![Field::DocumentType, Field::SubType, Field::Circuit]
        );
    }

    #[test]
    fn document_type_invalidates_subtype_and_circuit() {
        assert_eq!(
            invalidation_closure(Field::DocumentType),
            vec![Field::SubType, Field::Circuit]
        );
    }

    #[test]
    fn leaf_fields_invalidate_nothing() {
        assert!(invalidation_closure(Field::Title).is_empty());
        assert!(invalidation_closure(Field::SubType).is_empty());
        assert!(dependents_of(Field::Circuit).is_empty());
    }
}
