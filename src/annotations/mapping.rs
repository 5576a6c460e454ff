//! Merging of registry tables into the mapping used for one generation run.

use super::registry::{self, Dialect, DialectTable, Representation, Role};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// Which roles of a table take part in the mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoleInclusion {
    #[default]
    All,
    None,
    Only(BTreeSet<Role>),
}

impl RoleInclusion {
    pub fn includes(&self, role: Role) -> bool {
        match self {
            RoleInclusion::All => true,
            RoleInclusion::None => false,
            RoleInclusion::Only(roles) => roles.contains(&role),
        }
    }
}

/// Which third-party dialects are active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialectSelection {
    #[default]
    None,
    All,
    One(Dialect),
    Subset(Vec<Dialect>),
    /// Active dialects, each restricted to a set of roles
    PerRole(BTreeMap<Dialect, RoleInclusion>),
}

impl DialectSelection {
    /// Active dialects in mapping order, with the roles each contributes.
    pub fn active(&self) -> Vec<(Dialect, RoleInclusion)> {
        match self {
            DialectSelection::None => Vec::new(),
            DialectSelection::All => Dialect::ALL
                .into_iter()
                .map(|d| (d, RoleInclusion::All))
                .collect(),
            DialectSelection::One(dialect) => vec![(*dialect, RoleInclusion::All)],
            DialectSelection::Subset(dialects) => dialects
                .iter()
                .map(|d| (*d, RoleInclusion::All))
                .collect(),
            DialectSelection::PerRole(map) => {
                map.iter().map(|(d, inclusion)| (*d, inclusion.clone())).collect()
            }
        }
    }

    pub fn is_active(&self, dialect: Dialect) -> bool {
        self.active().iter().any(|(d, _)| *d == dialect)
    }
}

/// Inputs of [`build_effective_mapping`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MappingConfig {
    pub builtin: RoleInclusion,
    pub dialects: DialectSelection,
    /// Representations that replace every other source for their role
    pub overrides: BTreeMap<Role, Vec<Representation>>,
}

/// Role to representations for one run; immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EffectiveMapping {
    roles: BTreeMap<Role, Vec<Representation>>,
}

impl EffectiveMapping {
    /// Representations for a role in lookup order.
    pub fn representations(&self, role: Role) -> &[Representation] {
        self.roles.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Builds the effective mapping for a configuration.
///
/// For each role, representations are collected from the built-in table and
/// then from every active dialect in order, dropping repeated decorator names.
/// An override entry for a role replaces all of them.
pub fn build_effective_mapping(config: &MappingConfig) -> EffectiveMapping {
    let mut sources: Vec<(&DialectTable, RoleInclusion)> =
        vec![(registry::builtin(), config.builtin.clone())];
    for (dialect, inclusion) in config.dialects.active() {
        sources.push((dialect.table(), inclusion));
    }

    let mut roles = BTreeMap::new();
    for role in Role::ALL {
        if let Some(overrides) = config.overrides.get(&role) {
            roles.insert(role, overrides.clone());
            continue;
        }

        let mut merged: Vec<Representation> = Vec::new();
        for (table, inclusion) in &sources {
            if !inclusion.includes(role) {
                continue;
            }
            for representation in registry::lookup(table, role) {
                if !merged.iter().any(|r| r.name == representation.name) {
                    merged.push(representation.clone());
                }
            }
        }
        if !merged.is_empty() {
            roles.insert(role, merged);
        }
    }

    debug!(
        "Built decorator mapping: {} roles, dialects {:?}",
        roles.len(),
        config
            .dialects
            .active()
            .iter()
            .map(|(d, _)| d.name())
            .collect::<Vec<_>>()
    );
    EffectiveMapping { roles }
}

/// Per-run cache of built mappings keyed by configuration value.
#[derive(Debug, Default)]
pub struct MappingCache {
    entries: Vec<(MappingConfig, Rc<EffectiveMapping>)>,
}

impl MappingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, config: &MappingConfig) -> Rc<EffectiveMapping> {
        if let Some((_, mapping)) = self.entries.iter().find(|(c, _)| c == config) {
            return Rc::clone(mapping);
        }
        let mapping = Rc::new(build_effective_mapping(config));
        self.entries.push((config.clone(), Rc::clone(&mapping)));
        mapping
    }
}
