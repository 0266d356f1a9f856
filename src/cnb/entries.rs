use super::plan::BuildpackPlanEntry;

/// Collapses the buildpack plan entries for one dependency into the layer
/// visibility it needs.
pub trait EntryResolver {
    /// Returns `(launch, build)`.
    fn merge_layer_types(&self, name: &str, entries: &[BuildpackPlanEntry]) -> (bool, bool);
}

/// A layer is needed at launch (or build) when any entry with a matching
/// name asks for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanEntryResolver;

impl PlanEntryResolver {
    pub fn new() -> Self {
        Self
    }
}

impl EntryResolver for PlanEntryResolver {
    fn merge_layer_types(&self, name: &str, entries: &[BuildpackPlanEntry]) -> (bool, bool) {
        entries
            .iter()
            .filter(|entry| entry.name == name)
            .fold((false, false), |(launch, build), entry| {
                (launch || entry.flag("launch"), build || entry.flag("build"))
            })
    }
}
