//! CSS selectors for the schedule and directory pages
//!
//! Every selector is parsed once on first use. The patterns are constants,
//! so a parse failure is a programming error rather than a runtime condition.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    // Grid container chain
    pub(crate) static ref TIMETABLE_CONTAINER: Selector =
        parse_selector!("body div.container.timetable");
    pub(crate) static ref TIMETABLE_CARD: Selector =
        parse_selector!("div.card-default.timetable-card");
    pub(crate) static ref SCHEDULE_BODY: Selector = parse_selector!("div.schedule");
    pub(crate) static ref SCHEDULE_ITEMS: Selector = parse_selector!("div.schedule__items");

    // Lessons inside one slot
    pub(crate) static ref LESSON_WRAPPER: Selector =
        parse_selector!("div.schedule__lesson div.schedule__lesson-wrapper");
    pub(crate) static ref LESSON_INFO: Selector = parse_selector!("div.schedule__lesson-info");
    pub(crate) static ref DISCIPLINE: Selector =
        parse_selector!("div.body-text.schedule__discipline");
    pub(crate) static ref PLACE: Selector = parse_selector!("div.caption-text.schedule__place");
    pub(crate) static ref TEACHER: Selector = parse_selector!("div.schedule__teacher");
    pub(crate) static ref GROUPS_CONTAINER: Selector = parse_selector!("div.schedule__groups");
    pub(crate) static ref GROUP_CAPTION: Selector = parse_selector!("span.caption-text");
    pub(crate) static ref GROUP_LINK: Selector =
        parse_selector!("a.caption-text.schedule__group");

    // Directory pages
    pub(crate) static ref FACULTY_LINK: Selector =
        parse_selector!("div.faculties div.faculties__item a.h3-text[href]");
    pub(crate) static ref GROUP_CATALOG_LINK: Selector =
        parse_selector!("a.btn-text.group-catalog__group[href]");
    pub(crate) static ref SPAN: Selector = parse_selector!("span");
    pub(crate) static ref STAFF_CONTAINER: Selector = parse_selector!("div.container");
    pub(crate) static ref STAFF_ROW: Selector = parse_selector!("div.row");
    pub(crate) static ref STAFF_COLUMN: Selector =
        parse_selector!("div.col-12.col-md-8.order-2.order-md-1");
    pub(crate) static ref STAFF_LIST: Selector = parse_selector!("ul.list-group");
    pub(crate) static ref STAFF_LINK: Selector =
        parse_selector!("li.list-group-item.list-group-item-action a[href]");
}

/// Class markers a direct schedule-item child may carry
///
/// The site uses both interchangeably for slots of the weekly grid.
pub const ITEM_CLASSES: &[&str] = &["schedule__item", "schedule__item_show"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_parse() {
        // Forces every lazy selector to be built
        let all: [&Selector; 20] = [
            &*TIMETABLE_CONTAINER,
            &*TIMETABLE_CARD,
            &*SCHEDULE_BODY,
            &*SCHEDULE_ITEMS,
            &*LESSON_WRAPPER,
            &*LESSON_INFO,
            &*DISCIPLINE,
            &*PLACE,
            &*TEACHER,
            &*GROUPS_CONTAINER,
            &*GROUP_CAPTION,
            &*GROUP_LINK,
            &*FACULTY_LINK,
            &*GROUP_CATALOG_LINK,
            &*SPAN,
            &*STAFF_CONTAINER,
            &*STAFF_ROW,
            &*STAFF_COLUMN,
            &*STAFF_LIST,
            &*STAFF_LINK,
        ];
        assert_eq!(all.len(), 20);
    }
}
