//! Default names for newly created networks.

use std::collections::HashSet;

use bnc_types::{Network, NetworkId};

/// Lowest unused `Network<k>` name, `k >= 1`.
///
/// A name is taken if any network other than `exclude` uses it as its
/// display name or its relay name. Comparison is literal.
pub fn allocate_name<'a>(
    networks: impl IntoIterator<Item = &'a Network>,
    exclude: Option<NetworkId>,
) -> String {
    let mut taken: HashSet<&str> = HashSet::new();
    for network in networks {
        if Some(network.id) == exclude {
            continue;
        }
        taken.insert(network.name.as_str());
        if let Some(relay_name) = network.relay_name() {
            taken.insert(relay_name);
        }
    }

    (1u64..)
        .map(|k| format!("Network{}", k))
        .find(|name| !taken.contains(name.as_str()))
        .unwrap_or_default()
}
