use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use waypoint_parser::{normalize_name, Document, PlaceMark};

pub const DEFAULT_PALETTE_SIZE: u8 = 10;

/// Assigns color indices to place marks
///
/// Marks sharing a normalized name share a color. A new name takes the
/// smallest index not attached to any mark; once all `palette_size` indices
/// are in use, the n-th distinct name (0-based) takes `n % palette_size`.
/// Colors already written into a document are never changed, unless they
/// fall outside the palette or contradict an earlier mention of the name.
#[derive(Debug, Clone)]
pub struct PlaceRegistry {
    palette_size: u8,
    seen: BTreeMap<String, u8>,
    used: BTreeSet<u8>,
}

impl PlaceRegistry {
    pub fn new() -> Self {
        Self::with_palette(DEFAULT_PALETTE_SIZE)
    }

    pub fn with_palette(palette_size: u8) -> Self {
        Self {
            palette_size: palette_size.max(1),
            seen: BTreeMap::new(),
            used: BTreeSet::new(),
        }
    }

    pub fn palette_size(&self) -> u8 {
        self.palette_size
    }

    /// Color every uncolored mark and return all marks in document order
    ///
    /// Colors from markup outside the palette are dropped and reassigned.
    /// A name colored differently in several places takes the color of its
    /// first valid mention.
    pub fn scan(&mut self, doc: &mut Document) -> Vec<PlaceMark> {
        self.seen.clear();
        self.used.clear();

        let palette_size = self.palette_size;
        for mark in doc.place_marks() {
            match mark.color_index {
                Some(color) if color < palette_size => {
                    if let Entry::Vacant(entry) = self.seen.entry(mark.key()) {
                        entry.insert(color);
                        self.used.insert(color);
                    }
                }
                _ => {}
            }
        }

        let mut marks = Vec::new();
        doc.for_each_mark_mut(|mark| {
            match mark.color_index {
                Some(color) if color >= palette_size => {
                    tracing::warn!(name = %mark.display_name, color, palette_size, "color outside palette");
                    mark.color_index = None;
                }
                Some(color) => {
                    let first = self.seen.get(&mark.key()).copied();
                    if let Some(first) = first.filter(|&first| first != color) {
                        tracing::warn!(name = %mark.display_name, color, first, "conflicting place color");
                        mark.color_index = Some(first);
                    }
                }
                None => {}
            }
            if mark.color_index.is_none() {
                let color = self.assign_color(mark);
                mark.color_index = Some(color);
            }
            marks.push(mark.clone());
        });

        tracing::debug!(marks = marks.len(), names = self.seen.len(), "scanned place marks");
        marks
    }

    /// Color for `mark`, recording it for names not seen yet
    pub fn assign_color(&mut self, mark: &PlaceMark) -> u8 {
        let key = normalize_name(&mark.display_name);
        if let Some(&color) = self.seen.get(&key) {
            return color;
        }

        let color = (0..self.palette_size)
            .find(|c| !self.used.contains(c))
            .unwrap_or_else(|| (self.seen.len() % self.palette_size as usize) as u8);

        self.used.insert(color);
        self.seen.insert(key, color);
        color
    }

    /// Current name to color mapping
    pub fn assignments(&self) -> &BTreeMap<String, u8> {
        &self.seen
    }
}

impl Default for PlaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
