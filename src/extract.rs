//! Medal extraction from fetched member pages.
//!
//! A member page renders earned medals inside one section of the document;
//! each medal occupies a table cell holding a `span.medal_name` and a
//! `p.smaller` whose text reads `Earned <date text>`. This module walks that
//! section and produces `(name, raw date text)` pairs in document order.
//!
//! A page that parses fine but has no medal section at all is a real,
//! non-retryable outcome ([`Extraction::SectionAbsent`]) — the profile
//! exists, it just has nothing to show. A cell that has one half of the
//! name/date pair but not the other means the markup changed under us and is
//! surfaced as a [`MalformedCell`](ExtractError::MalformedCell) error so the
//! caller can retry the fetch.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// One medal as extracted from the page, date text still unnormalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMedal {
    pub name: String,
    pub raw_date: String,
}

/// Outcome of extracting a well-formed page.
#[derive(Debug, PartialEq, Eq)]
pub enum Extraction {
    /// The medal section was present; zero medals is a valid result.
    Records(Vec<RawMedal>),
    /// The medal section is missing from an otherwise readable page.
    SectionAbsent,
}

/// Extraction failures that indicate a malformed document.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A medal cell had a name without a date, or a date without a name.
    #[error("malformed medal cell: {detail}")]
    MalformedCell { detail: String },
}

const CELL_SELECTOR: &str = "td";
const NAME_SELECTOR: &str = "span.medal_name";
const DATE_SELECTOR: &str = "p.smaller";
const EARNED_PREFIX: &str = "Earned ";

fn inner_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Extract all medals from the section matched by `section`, in document
/// order. Returns [`Extraction::SectionAbsent`] when the selector matches
/// nothing.
pub fn extract(html: &Html, section: &Selector) -> Result<Extraction, ExtractError> {
    let cell_sel = Selector::parse(CELL_SELECTOR).unwrap();
    let name_sel = Selector::parse(NAME_SELECTOR).unwrap();
    let date_sel = Selector::parse(DATE_SELECTOR).unwrap();

    let Some(section_el) = html.select(section).next() else {
        return Ok(Extraction::SectionAbsent);
    };

    let mut medals = Vec::new();
    for cell in section_el.select(&cell_sel) {
        let name = cell.select(&name_sel).next();
        let date = cell.select(&date_sel).next();
        match (name, date) {
            // Layout cells without medal content are expected.
            (None, None) => continue,
            (Some(name), Some(date)) => {
                let raw = inner_text(date);
                let raw_date = raw.strip_prefix(EARNED_PREFIX).unwrap_or(&raw).to_string();
                medals.push(RawMedal {
                    name: inner_text(name),
                    raw_date,
                });
            }
            (Some(name), None) => {
                return Err(ExtractError::MalformedCell {
                    detail: format!("medal {:?} has no earned date", inner_text(name)),
                });
            }
            (None, Some(_)) => {
                return Err(ExtractError::MalformedCell {
                    detail: "earned date without a medal name".to_string(),
                });
            }
        }
    }
    Ok(Extraction::Records(medals))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medal_cell(name: &str, date: &str) -> String {
        format!(
            "<td style='vertical-align:top;text-align:center;'>\
             <span class='medal_name'>{name}</span>\
             <p class='smaller'>Earned {date}</p></td>"
        )
    }

    fn page(section_body: &str) -> Html {
        Html::parse_document(&format!(
            "<html><body><div id='medals'><table><tr>{section_body}</tr></table></div></body></html>"
        ))
    }

    fn medals_section() -> Selector {
        Selector::parse("#medals").unwrap()
    }

    #[test]
    fn extracts_medals_in_document_order() {
        let html = page(&format!(
            "{}{}",
            medal_cell("First Blood", "on Dec 31 2023, 11:59 PM"),
            medal_cell("Survivor", "at 3:15 PM")
        ));
        let Extraction::Records(medals) = extract(&html, &medals_section()).unwrap() else {
            panic!("section should be present");
        };
        assert_eq!(
            medals,
            vec![
                RawMedal {
                    name: "First Blood".into(),
                    raw_date: "on Dec 31 2023, 11:59 PM".into()
                },
                RawMedal {
                    name: "Survivor".into(),
                    raw_date: "at 3:15 PM".into()
                },
            ]
        );
    }

    #[test]
    fn strips_earned_prefix_only() {
        let html = page(&medal_cell("Pacifist", "yesterday, 9:02 AM"));
        let Extraction::Records(medals) = extract(&html, &medals_section()).unwrap() else {
            panic!("section should be present");
        };
        assert_eq!(medals[0].raw_date, "yesterday, 9:02 AM");
    }

    #[test]
    fn zero_matching_cells_is_an_empty_success() {
        let html = page("<td>just layout</td>");
        assert_eq!(
            extract(&html, &medals_section()).unwrap(),
            Extraction::Records(vec![])
        );
    }

    #[test]
    fn missing_section_is_section_absent() {
        let html = Html::parse_document("<html><body><p>no medals here</p></body></html>");
        assert_eq!(
            extract(&html, &medals_section()).unwrap(),
            Extraction::SectionAbsent
        );
    }

    #[test]
    fn name_without_date_is_malformed() {
        let html = page("<td><span class='medal_name'>Broken</span></td>");
        let err = extract(&html, &medals_section()).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedCell { .. }));
    }

    #[test]
    fn date_without_name_is_malformed() {
        let html = page("<td><p class='smaller'>Earned at 1:00 PM</p></td>");
        let err = extract(&html, &medals_section()).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedCell { .. }));
    }
}
