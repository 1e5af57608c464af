//! Deterministic disambiguation of colliding artifact names.
//!
//! Distinct items sometimes share a display name. Since the artifact path is
//! derived from the name, two such items would share one completion marker and
//! the second would never be exported. Colliding names get an id suffix:
//!
//! 1. every item in a collision group gets `-<last 3 chars of id>`
//! 2. names still colliding get `-<last 6 chars of id>` instead, or the full id
//!    when the 6-char form would collide as well
//!
//! A name stored on an item is never recomputed. Snapshots persist the names,
//! so an item keeps its marker when later catalogs add same-named items.

use std::collections::{HashMap, HashSet};

use crate::download::sanitize_filename;

use super::item::{Catalog, CatalogItem};

/// Returns one unique, filesystem-safe artifact name per item, in item order.
///
/// Items carrying an [`artifact_name`](CatalogItem::artifact_name) keep it.
/// The others are disambiguated among themselves and then against the stored
/// names.
#[must_use]
pub fn disambiguate_names(items: &[CatalogItem]) -> Vec<String> {
    resolve_names(items, &HashSet::new())
}

/// Stores an artifact name on every item.
///
/// Items listed in `known` take the name they resolve to there. The rest get
/// fresh names that avoid every name `known` uses.
pub fn assign_artifact_names(items: &mut [CatalogItem], known: &Catalog) {
    let known_names: HashMap<&str, String> = known
        .iter()
        .map(|item| item.id.as_str())
        .zip(disambiguate_names(known.items()))
        .collect();
    let reserved: HashSet<String> = known_names.values().cloned().collect();

    for item in items.iter_mut() {
        if let Some(name) = known_names.get(item.id.as_str()) {
            item.artifact_name = Some(name.clone());
        }
    }
    let names = resolve_names(items, &reserved);
    for (item, name) in items.iter_mut().zip(names) {
        item.artifact_name = Some(name);
    }
}

fn resolve_names(items: &[CatalogItem], reserved: &HashSet<String>) -> Vec<String> {
    let mut names: Vec<Option<String>> =
        items.iter().map(|item| item.artifact_name.clone()).collect();
    let mut taken = reserved.clone();
    taken.extend(names.iter().flatten().cloned());

    let pending: Vec<usize> = (0..items.len()).filter(|&i| names[i].is_none()).collect();
    let fresh = fresh_names(&pending.iter().map(|&i| &items[i]).collect::<Vec<_>>());
    for (index, candidate) in pending.into_iter().zip(fresh) {
        let name = if taken.contains(&candidate) {
            unclaimed(&items[index], &taken)
        } else {
            candidate
        };
        taken.insert(name.clone());
        names[index] = Some(name);
    }

    names.into_iter().flatten().collect()
}

fn fresh_names(items: &[&CatalogItem]) -> Vec<String> {
    let bases: Vec<String> = items.iter().map(|item| sanitize_filename(&item.name)).collect();
    let mut names = bases.clone();

    for indices in collision_groups(&names) {
        for index in indices {
            names[index] = with_suffix(&bases[index], tail(&items[index].id, 3));
        }
    }

    for indices in collision_groups(&names) {
        for index in indices {
            let candidate = with_suffix(&bases[index], tail(&items[index].id, 6));
            let taken = names
                .iter()
                .enumerate()
                .any(|(other, name)| other != index && *name == candidate);
            names[index] = if taken {
                with_suffix(&bases[index], &items[index].id)
            } else {
                candidate
            };
        }
    }

    names
}

/// First suffixed form of the item's name that nothing has claimed.
fn unclaimed(item: &CatalogItem, taken: &HashSet<String>) -> String {
    let base = sanitize_filename(&item.name);
    [tail(&item.id, 3), tail(&item.id, 6)]
        .into_iter()
        .map(|suffix| with_suffix(&base, suffix))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| with_suffix(&base, &item.id))
}

/// Indices of every name that occurs more than once, grouped by name and
/// ordered by first occurrence.
fn collision_groups(names: &[String]) -> Vec<Vec<usize>> {
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for (index, name) in names.iter().enumerate() {
        let entry = groups.entry(name.as_str()).or_default();
        if entry.is_empty() {
            order.push(name.as_str());
        }
        entry.push(index);
    }
    order
        .into_iter()
        .filter_map(|name| groups.remove(name))
        .filter(|indices| indices.len() > 1)
        .collect()
}

fn tail(id: &str, count: usize) -> &str {
    let skip = id.chars().count().saturating_sub(count);
    id.char_indices().nth(skip).map_or(id, |(offset, _)| &id[offset..])
}

fn with_suffix(base: &str, suffix: &str) -> String {
    sanitize_filename(&format!("{base}-{suffix}"))
}
