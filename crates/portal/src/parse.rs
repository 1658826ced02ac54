//! HTML parsing for the portal's server-rendered fragments.
//!
//! The portal's markup changes shape often; everything selector-shaped lives
//! in this one module, extracted as pure functions for testability with
//! fixture HTML. Entries that fail to parse are skipped with a warning
//! rather than failing the whole scrape.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::error::PortalError;
use rebook_core::models::class::{
    BookingForm, ClassCandidate, FormKind, LiveBookingSnapshot,
};

fn selector(css: &str) -> Result<Selector, PortalError> {
    Selector::parse(css).map_err(|e| PortalError::Parse(format!("invalid selector {css}: {e:?}")))
}

/// Extract the CSRF token from a page's meta tag.
pub fn parse_csrf_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let sel = Selector::parse(r#"meta[name="csrf-token"]"#).ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::to_string)
}

/// Parse the schedule partial for one date into candidates.
pub fn parse_schedule(html: &str) -> Result<Vec<ClassCandidate>, PortalError> {
    let document = Html::parse_document(html);

    let entry_sel = selector("div.class.grid")?;
    let title_sel = selector("h2.title")?;
    let time_sel = selector(r#"span[itemprop="startDate"]"#)?;
    let remaining_sel = selector("span.remaining")?;
    let paragraph_sel = selector("p")?;

    let mut candidates = Vec::new();

    for entry in document.select(&entry_sel) {
        let Some(name) = entry
            .select(&title_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|n| !n.is_empty())
        else {
            warn!("Skipping class entry without a title");
            continue;
        };

        let raw_time = entry
            .select(&time_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        let Ok(start_time) = NaiveTime::parse_from_str(&raw_time, "%H:%M") else {
            warn!("Skipping class '{}' with unparseable time '{}'", name, raw_time);
            continue;
        };

        let instructor = entry
            .select(&paragraph_sel)
            .map(|p| p.text().collect::<String>().trim().to_string())
            .find(|text| text.to_lowercase().starts_with("with "))
            .map(|text| text[5..].trim().trim_end_matches('.').to_string());

        let remaining_spaces = entry
            .select(&remaining_sel)
            .next()
            .and_then(|el| el.text().collect::<String>().trim().parse().ok());

        let form = parse_booking_form(&entry)?;
        let status_note = if form.is_none() {
            extract_status_note(&entry)
        } else {
            None
        };

        candidates.push(ClassCandidate {
            name,
            start_time,
            instructor,
            remaining_spaces,
            form,
            status_note,
        });
    }

    Ok(candidates)
}

fn parse_booking_form(entry: &ElementRef) -> Result<Option<BookingForm>, PortalError> {
    let form_sel = selector("form[data-request]")?;
    let id_sel = selector(r#"input[name="id"]"#)?;
    let timestamp_sel = selector(r#"input[name="timestamp"]"#)?;
    let button_sel = selector(r#"button[type="submit"]"#)?;

    let Some(form) = entry.select(&form_sel).next() else {
        return Ok(None);
    };

    let Some(handler) = form.value().attr("data-request") else {
        return Ok(None);
    };

    let class_id = form
        .select(&id_sel)
        .next()
        .and_then(|input| input.value().attr("value"));
    let timestamp = form
        .select(&timestamp_sel)
        .next()
        .and_then(|input| input.value().attr("value"));
    let (Some(class_id), Some(timestamp)) = (class_id, timestamp) else {
        return Ok(None);
    };

    let kind = form.select(&button_sel).next().and_then(|button| {
        let classes: Vec<_> = button.value().classes().collect();
        if classes.contains(&"signup") {
            Some(FormKind::Signup)
        } else if classes.contains(&"waitinglist") {
            Some(FormKind::WaitingList)
        } else if classes.contains(&"cancel") {
            Some(FormKind::Cancel)
        } else {
            None
        }
    });

    Ok(kind.map(|kind| BookingForm {
        class_id: class_id.to_string(),
        timestamp: timestamp.to_string(),
        handler: handler.to_string(),
        kind,
    }))
}

fn extract_status_note(entry: &ElementRef) -> Option<String> {
    let text = entry.text().collect::<String>();
    let re = Regex::new(r"(?i)you are (?:already registered|on the waiting list)[^.]*").ok()?;
    re.find(&text).map(|m| m.as_str().trim().to_string())
}

/// Whether a status note means the user already holds this class.
pub fn is_already_held_note(note: &str) -> bool {
    let lower = note.to_lowercase();
    lower.contains("already registered")
        || lower.contains("waiting list")
        || lower.contains("already booked")
}

/// Parse the members-page list of currently held bookings.
pub fn parse_current_bookings(html: &str) -> Result<Vec<LiveBookingSnapshot>, PortalError> {
    let document = Html::parse_document(html);
    let container_sel = selector("#upcoming_bookings")?;
    let item_sel = selector("li")?;

    let Some(container) = document.select(&container_sel).next() else {
        warn!("Members page has no upcoming bookings container");
        return Ok(Vec::new());
    };

    let line_re = Regex::new(r"^(?P<name>.+?)\s*-\s*(?P<date>\d{4}-\d{2}-\d{2})\s+(?P<time>\d{2}:\d{2})$")
        .map_err(|e| PortalError::Parse(format!("invalid booking line pattern: {e}")))?;

    let mut bookings = Vec::new();

    for item in container.select(&item_sel) {
        let raw = item.text().collect::<String>();
        let waitlisted = raw.contains("WAITINGLIST");
        let line = raw.replace("WAITINGLIST", "");
        let line = line.trim();

        let Some(captures) = line_re.captures(line) else {
            warn!("Could not parse booking line: {}", line);
            continue;
        };

        let date = NaiveDate::parse_from_str(&captures["date"], "%Y-%m-%d");
        let time = NaiveTime::parse_from_str(&captures["time"], "%H:%M");
        let (Ok(class_date), Ok(class_time)) = (date, time) else {
            warn!("Could not parse booking date/time in line: {}", line);
            continue;
        };

        bookings.push(LiveBookingSnapshot {
            class_name: captures["name"].trim().to_string(),
            class_date,
            class_time,
            waitlisted,
        });
    }

    Ok(bookings)
}
