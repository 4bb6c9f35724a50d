use super::descriptor::{Attribute, WidgetDescriptor};
use super::node::ConcreteNode;
use std::collections::HashSet;

/// Decide whether a live node is the widget a descriptor refers to.
///
/// * `located_by = xpath`: fingerprints must be equal and non-empty; nothing else counts.
/// * `located_by = <attr>`: only that attribute is compared, and it must be non-empty.
/// * no `located_by`: every attribute except the fingerprint must be equal, skipping
///   the ones in `masked`. Empty and absent are the same value.
pub fn is_similar(
    descriptor: &WidgetDescriptor,
    node: &ConcreteNode,
    masked: &HashSet<Attribute>,
) -> bool {
    if let Some(authority) = descriptor.locating_attribute() {
        let expected = descriptor.value(authority);
        return !expected.is_empty() && expected == node.value(authority);
    }

    Attribute::CONTENT
        .iter()
        .filter(|attribute| !masked.contains(attribute))
        .all(|attribute| descriptor.value(*attribute) == node.value(*attribute))
}
