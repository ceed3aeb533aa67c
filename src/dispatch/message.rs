//! Alert message template and delivery deep links.

use core::fmt::Write as _;

use chrono::{DateTime, TimeZone};

use super::location::{LOCATION_PLACEHOLDER, LocationFix};

const HEADER: &str = "RAKSHA EMERGENCY ALERT";
const PLEA: &str = "I am in danger and need immediate help!";
const EVIDENCE_LINE: &str = "Audio evidence is being recorded.";
const LAST_KNOWN_NOTE: &str = "(last known position)";

/// Human-readable send time, e.g. `07/03/2024, 09:05:02 pm`.
pub fn format_sent_at<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: core::fmt::Display,
{
    at.format("%d/%m/%Y, %I:%M:%S %P").to_string()
}

/// Render the fixed alert text.  Deterministic for a given input.
pub fn compose<Tz: TimeZone>(
    location: Option<&LocationFix>,
    recording: bool,
    sent_at: &DateTime<Tz>,
) -> String
where
    Tz::Offset: core::fmt::Display,
{
    let mut msg = String::with_capacity(256);
    let _ = write!(msg, "{HEADER}\n\n{PLEA}\n\nMy location:\n");
    match location {
        Some(fix) => {
            msg.push_str(&fix.maps_url());
            if fix.is_last_known {
                msg.push('\n');
                msg.push_str(LAST_KNOWN_NOTE);
            }
        }
        None => msg.push_str(LOCATION_PLACEHOLDER),
    }
    msg.push_str("\n\n");
    if recording {
        msg.push_str(EVIDENCE_LINE);
        msg.push('\n');
    }
    let _ = write!(msg, "Alert sent: {}", format_sent_at(sent_at));
    msg
}

/// Messaging-app deep link (primary channel).  Both parameters are
/// percent-encoded: a bare `+` in a query string decodes to a space.
pub fn primary_link(contact: &str, message: &str) -> String {
    format!(
        "whatsapp://send?text={}&phone={}",
        urlencoding::encode(message),
        urlencoding::encode(contact)
    )
}

/// Native SMS link (fallback channel).
pub fn fallback_link(contact: &str, message: &str) -> String {
    format!("sms:{}?body={}", contact, urlencoding::encode(message))
}
