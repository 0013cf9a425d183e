//! Schedule grid extraction
//!
//! Walks the fixed container chain of a schedule page
//! (container → card → body → items) and turns every direct schedule item
//! into one [`SlotCell`], in document order.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::models::SlotCell;
use crate::parser::lesson::normalize_cell;
use crate::parser::selectors::{
    ITEM_CLASSES, SCHEDULE_BODY, SCHEDULE_ITEMS, TIMETABLE_CARD, TIMETABLE_CONTAINER,
};
use crate::utils::error::{GridStage, StructureMissing};

/// Parsed schedule page
///
/// Holds the markup tree of one fetched document. It is not `Send`, so it
/// lives only between the fetch and the extraction of one refresh.
pub struct ScheduleDocument {
    html: Html,
}

impl ScheduleDocument {
    /// Parse a full HTML document
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Locate the items container through the container chain
    ///
    /// # Errors
    ///
    /// Returns `StructureMissing` naming the first stage that was absent
    pub fn locate_items(&self) -> Result<ElementRef<'_>, StructureMissing> {
        let container = self
            .html
            .select(&TIMETABLE_CONTAINER)
            .next()
            .ok_or(StructureMissing {
                stage: GridStage::Container,
            })?;

        let card = first_within(container, &TIMETABLE_CARD, GridStage::Card)?;
        let body = first_within(card, &SCHEDULE_BODY, GridStage::Body)?;
        first_within(body, &SCHEDULE_ITEMS, GridStage::Items)
    }

    /// Raw schedule items, direct children of the items container
    ///
    /// # Errors
    ///
    /// Returns `StructureMissing` when the container chain is broken
    pub fn items(&self) -> Result<Vec<ElementRef<'_>>, StructureMissing> {
        let container = self.locate_items()?;

        Ok(container
            .children()
            .filter_map(ElementRef::wrap)
            .filter(is_schedule_item)
            .collect())
    }

    /// Extract the unfiltered slot cell sequence
    ///
    /// A broken container chain is logged and yields an empty sequence.
    pub fn extract_cells(&self) -> Vec<SlotCell> {
        match self.items() {
            Ok(items) => {
                let cells: Vec<SlotCell> = items.into_iter().map(normalize_cell).collect();
                debug!(cells = cells.len(), "Extracted schedule cells");
                cells
            }
            Err(e) => {
                warn!(stage = %e.stage, "{e}, returning empty schedule");
                Vec::new()
            }
        }
    }
}

fn first_within<'a>(
    scope: ElementRef<'a>,
    selector: &Selector,
    stage: GridStage,
) -> Result<ElementRef<'a>, StructureMissing> {
    scope.select(selector).next().ok_or(StructureMissing { stage })
}

fn is_schedule_item(element: &ElementRef<'_>) -> bool {
    element.value().name() == "div"
        && element
            .value()
            .classes()
            .any(|class| ITEM_CLASSES.contains(&class))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: &str) -> String {
        format!(
            r#"<html><body><div class="container timetable">
                 <div class="card-default timetable-card"><div class="schedule">
                   <div class="schedule__items">{items}</div>
                 </div></div>
               </div></body></html>"#
        )
    }

    #[test]
    fn test_missing_container_yields_empty() {
        let doc = ScheduleDocument::parse("<html><body><p>Неделя не найдена</p></body></html>");
        assert_eq!(
            doc.locate_items().unwrap_err().stage,
            GridStage::Container
        );
        assert!(doc.extract_cells().is_empty());
    }

    #[test]
    fn test_missing_items_stage_reported() {
        let doc = ScheduleDocument::parse(
            r#"<html><body><div class="container timetable">
                 <div class="card-default timetable-card"><div class="schedule"></div></div>
               </div></body></html>"#,
        );
        assert_eq!(doc.locate_items().unwrap_err().stage, GridStage::Items);
        assert!(doc.extract_cells().is_empty());
    }

    #[test]
    fn test_both_item_markers_counted_in_order() {
        let doc = ScheduleDocument::parse(&page(
            r#"<div class="schedule__item"></div>
               <div class="schedule__head">Пн</div>
               <div class="schedule__item schedule__item_show"></div>
               <div class="schedule__item_show"></div>
               <div class="schedule__time">08:00</div>"#,
        ));
        let cells = doc.extract_cells();

        assert_eq!(cells.len(), 3);
        assert!(cells.iter().all(SlotCell::is_placeholder));
    }

    #[test]
    fn test_nested_items_are_not_slots() {
        let doc = ScheduleDocument::parse(&page(
            r#"<div class="schedule__item"><div class="schedule__item"></div></div>"#,
        ));
        assert_eq!(doc.extract_cells().len(), 1);
    }
}
