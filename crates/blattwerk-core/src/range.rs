// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range expressions such as "1-3,5,8".
//
// Parsing is total: a token that does not parse, a reversed span, or a page
// number outside the document contributes nothing. The expression is usually
// typed live into a text field, so a half-typed "3-" must never be an error.

use std::collections::BTreeSet;

/// Parse a range expression into the set of 1-based page numbers it names,
/// bounded to `[1, total_pages]`.
///
/// Numbers outside the document are dropped, not clamped, so `"2-4"` on a
/// three page document yields `{2, 3}`.
pub fn parse_page_ranges(expr: &str, total_pages: usize) -> BTreeSet<usize> {
    let mut pages = BTreeSet::new();

    for token in expr.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        match token.split_once('-') {
            Some((start, end)) => {
                let (Some(start), Some(end)) = (parse_number(start), parse_number(end)) else {
                    continue;
                };
                if start > end {
                    continue;
                }
                let first = start.max(1);
                let last = end.min(total_pages as u64);
                if first <= last {
                    pages.extend((first as usize)..=(last as usize));
                }
            }
            None => {
                if let Some(number) = parse_number(token)
                    && number >= 1
                    && number <= total_pages as u64
                {
                    pages.insert(number as usize);
                }
            }
        }
    }

    pages
}

/// Render a page set in canonical form, collapsing consecutive runs:
/// `{1, 2, 3, 5}` becomes `"1-3,5"`.
pub fn format_page_ranges(pages: &BTreeSet<usize>) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut iter = pages.iter().copied();
    let Some(mut run_start) = iter.next() else {
        return String::new();
    };
    let mut run_end = run_start;

    for page in iter {
        if page == run_end + 1 {
            run_end = page;
            continue;
        }
        parts.push(format_run(run_start, run_end));
        run_start = page;
        run_end = page;
    }
    parts.push(format_run(run_start, run_end));

    parts.join(",")
}

fn format_run(start: usize, end: usize) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

fn parse_number(text: &str) -> Option<u64> {
    text.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pages: &[usize]) -> BTreeSet<usize> {
        pages.iter().copied().collect()
    }

    #[test]
    fn mixed_singles_and_spans() {
        assert_eq!(parse_page_ranges("1-3,5,8", 10), set(&[1, 2, 3, 5, 8]));
    }

    #[test]
    fn reversed_span_contributes_nothing() {
        assert!(parse_page_ranges("5-2", 10).is_empty());
    }

    #[test]
    fn out_of_bounds_numbers_are_dropped() {
        assert!(parse_page_ranges("0,11", 10).is_empty());
    }

    #[test]
    fn empty_expression_is_empty_set() {
        assert!(parse_page_ranges("", 10).is_empty());
    }

    #[test]
    fn span_is_cut_at_document_end() {
        assert_eq!(parse_page_ranges("2-4", 3), set(&[2, 3]));
    }

    #[test]
    fn whitespace_and_duplicates() {
        assert_eq!(parse_page_ranges(" 2 , 2-3 ,3 ", 5), set(&[2, 3]));
        assert_eq!(parse_page_ranges("1 - 2", 5), set(&[1, 2]));
    }

    #[test]
    fn half_typed_tokens_are_ignored() {
        assert_eq!(parse_page_ranges("3-", 10), set(&[]));
        assert_eq!(parse_page_ranges("1,4-,x,-2", 10), set(&[1]));
        assert!(parse_page_ranges("1-2-3", 10).is_empty());
    }

    #[test]
    fn huge_span_is_bounded() {
        assert_eq!(parse_page_ranges("9-99999999999", 10), set(&[9, 10]));
    }

    #[test]
    fn zero_page_document_is_always_empty() {
        assert!(parse_page_ranges("1-5", 0).is_empty());
    }

    #[test]
    fn format_collapses_runs() {
        assert_eq!(format_page_ranges(&set(&[1, 2, 3, 5, 8, 9])), "1-3,5,8-9");
        assert_eq!(format_page_ranges(&set(&[])), "");
        assert_eq!(format_page_ranges(&set(&[4])), "4");
    }

    #[test]
    fn formatted_output_parses_back() {
        let pages = set(&[2, 3, 4, 7, 10]);
        assert_eq!(parse_page_ranges(&format_page_ranges(&pages), 10), pages);
    }
}
