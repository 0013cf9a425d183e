//! Lesson normalization for one schedule slot
//!
//! Turns the markup of a single schedule item into a [`SlotCell`]. Missing
//! sub-nodes become `None` fields or skipped entries, never errors.

use scraper::ElementRef;
use tracing::debug;

use crate::models::{GroupLink, Groups, Lesson, SlotCell};
use crate::parser::selectors::{
    DISCIPLINE, GROUPS_CONTAINER, GROUP_CAPTION, GROUP_LINK, LESSON_INFO, LESSON_WRAPPER, PLACE,
    TEACHER,
};
use crate::utils::non_empty;

/// Normalize one schedule item into a slot cell
///
/// An item without any lesson wrapper is the "no lesson" placeholder. A
/// wrapper without its info node is skipped, so an item whose wrappers are
/// all malformed yields an empty lesson list rather than a placeholder.
pub fn normalize_cell(item: ElementRef<'_>) -> SlotCell {
    let wrappers: Vec<ElementRef<'_>> = item.select(&LESSON_WRAPPER).collect();

    if wrappers.is_empty() {
        return SlotCell::Placeholder;
    }

    let mut lessons = Vec::with_capacity(wrappers.len());
    for (index, wrapper) in wrappers.into_iter().enumerate() {
        match wrapper.select(&LESSON_INFO).next() {
            Some(info) => lessons.push(extract_lesson(info)),
            None => debug!(wrapper = index, "Lesson wrapper without info node, skipping"),
        }
    }

    SlotCell::Lessons(lessons)
}

/// Extract one lesson from its info node
pub fn extract_lesson(info: ElementRef<'_>) -> Lesson {
    Lesson {
        discipline: select_text(info, &DISCIPLINE),
        place: select_text(info, &PLACE),
        teacher: select_text(info, &TEACHER),
        groups: extract_groups(info),
    }
}

/// Extract the groups attending a lesson
///
/// An aggregated caption wins over linked entries; the two forms are never
/// combined. No groups container means no groups.
pub fn extract_groups(info: ElementRef<'_>) -> Groups {
    let Some(container) = info.select(&GROUPS_CONTAINER).next() else {
        return Groups::default();
    };

    let captions: Vec<ElementRef<'_>> = container.select(&GROUP_CAPTION).collect();
    if !captions.is_empty() {
        let label: String = captions.iter().flat_map(|c| c.text()).collect();
        return Groups::Aggregated(label.trim().to_string());
    }

    Groups::Linked(
        container
            .select(&GROUP_LINK)
            .map(|link| GroupLink {
                number: element_text(link).trim().to_string(),
                href: link.value().attr("href").map(str::to_string),
            })
            .collect(),
    )
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Trimmed text of the first match, `None` when absent or blank
fn select_text(scope: ElementRef<'_>, selector: &scraper::Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|el| non_empty(&element_text(el)))
}
