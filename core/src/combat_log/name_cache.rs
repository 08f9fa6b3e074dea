use hashbrown::HashMap;

use super::event::ParsedLogEvent;

/// Name → actor id memo, built up from action lines.
///
/// Death and effect lines only carry names; action lines carry both. Owned by
/// whoever consumes parsed events, and cleared when the encounter changes.
#[derive(Debug, Default, Clone)]
pub struct NameCache {
    ids: HashMap<String, u32>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember every (name, id) pair the event carries.
    pub fn observe(&mut self, event: &ParsedLogEvent) {
        self.remember(event.source_name.as_deref(), event.source_id);
        self.remember(event.target_name.as_deref(), event.target_id);
    }

    fn remember(&mut self, name: Option<&str>, id: Option<u32>) {
        let (Some(name), Some(id)) = (name, id) else {
            return;
        };
        if name.is_empty() || id == 0 {
            return;
        }
        if let Some(existing) = self.ids.get_mut(name) {
            *existing = id;
        } else {
            self.ids.insert(name.to_string(), id);
        }
    }

    pub fn resolve(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    /// Fill in missing source/target ids from known names.
    pub fn fill_ids(&self, event: &mut ParsedLogEvent) {
        if event.source_id.is_none() {
            event.source_id = event.source_name.as_deref().and_then(|n| self.resolve(n));
        }
        if event.target_id.is_none() {
            event.target_id = event.target_name.as_deref().and_then(|n| self.resolve(n));
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
