//! Property-based tests for the page_log parser

use chrono_tz::Tz;
use cupstat::parser::LineParser;
use proptest::prelude::*;

fn parser() -> LineParser {
    LineParser::new(Tz::UTC)
}

proptest! {
    /// The parser never panics, whatever the input line looks like.
    #[test]
    fn parser_never_panics(line in "\\PC{0,200}") {
        let _ = parser().parse(&line);
    }

    /// Lines with fewer than ten fields are always rejected.
    #[test]
    fn short_lines_are_rejected(tokens in prop::collection::vec("[a-su-z0-9-]{1,8}", 0..9)) {
        let line = tokens.join(" ");
        prop_assert!(parser().parse(&line).is_none());
    }

    /// Well-formed lines always yield exactly one record with the
    /// positional fields in place.
    #[test]
    fn well_formed_lines_are_accepted(
        printer in "[A-SU-Za-su-z][A-SU-Za-su-z0-9-]{0,15}",
        user in "[a-su-z][a-su-z0-9]{0,11}",
        job_id in "[0-9]{1,6}",
        page in 1u32..500,
        copies in 1u32..100,
        hour in 0u32..24,
    ) {
        // The generators avoid 't' so the trailer marker cannot appear.
        let line = format!(
            "{printer} {user} {job_id} [03/Jun/2024:{hour:02}:00:00] {page} {copies} - ws-host doc.pdf A4 one-sided"
        );
        let job = parser().parse(&line).expect("well-formed line must parse");
        prop_assert_eq!(job.printer.as_str(), printer.as_str());
        prop_assert_eq!(job.user.as_str(), user.as_str());
        prop_assert_eq!(job.job_id.as_str(), job_id.as_str());
        prop_assert_eq!(job.page_number, page);
        prop_assert_eq!(job.num_copies, copies);
        prop_assert_eq!(job.date_time.hour_in(&Tz::UTC), hour);
    }

    /// Non-numeric count tokens coerce to the default of one.
    #[test]
    fn non_numeric_counts_default(
        page_token in "[a-su-z]{1,6}",
        copies_token in "[a-su-z]{1,6}",
    ) {
        let line = format!(
            "HP alice 1 [03/Jun/2024:10:00:00] {page_token} {copies_token} - ws-host doc.pdf A4 one-sided"
        );
        let job = parser().parse(&line).expect("line is structurally valid");
        prop_assert_eq!(job.page_number, 1);
        prop_assert_eq!(job.num_copies, 1);
    }
}
