//! Scientific name cleaning ahead of taxonomic lookups

use regex::Regex;

/// Substrings after which the rest of a name is discarded
const TRUNCATE_AT: &[&str] = &[
    "(",
    " AND ",
    "/",
    " & ",
    " vs ",
    " undescribed ",
    ",",
    " formerly ",
    " near ",
    "Columbia Basin",
    "Puget Trough",
    " n.sp. ",
    " n. ",
    " sp. ",
    " sp ",
    " pop. ",
    " spp. ",
    " cf. ",
    " ] ",
];

const REMOVE: &[&str] = &["?", "Family "];

lazy_static::lazy_static! {
    static ref DIGITS: Regex = Regex::new(r"\d+").expect("valid digits pattern");
    // Spans in parentheses, brackets or quotes
    static ref ENCLOSED: Regex = Regex::new(r#"[\(\["].*?[\)\]"]"#).expect("valid enclosed pattern");
}

/// Clean a raw scientific name string into something ITIS/WoRMS/GBIF can match.
///
/// Digits and bracketed or quoted asides are dropped, qualifiers such as
/// `sp.`, `cf.` or `formerly` truncate the name, `subsp.` becomes `ssp.` and a
/// dangling infraspecific marker is removed. Returns `None` when nothing usable
/// is left.
pub fn clean_scientific_name(raw: &str) -> Option<String> {
    let name = DIGITS.replace_all(raw, "");
    let name = ENCLOSED.replace_all(&name, "");
    let mut name = name.split_whitespace().collect::<Vec<_>>().join(" ");

    for token in REMOVE {
        name = name.replace(token, "");
    }

    name = name.replace("subsp.", "ssp.");

    name.push(' ');
    while TRUNCATE_AT.iter().any(|s| name.contains(s)) {
        for s in TRUNCATE_AT {
            if let Some(idx) = name.find(s) {
                name.truncate(idx);
            }
            name.push(' ');
        }
    }
    let mut name = name.trim().to_string();

    if name.contains('_') {
        name = name.split('_').collect::<Vec<_>>().join(" ");
    }

    if let Some((head, last)) = name.rsplit_once(' ') {
        if last == "ssp." || last == "var." {
            name = head.to_string();
        }
    } else if name == "ssp." || name == "var." {
        name.clear();
    }

    let name = capitalize(&name);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Uppercase the first character and lowercase the rest
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_binomial_unchanged() {
        assert_eq!(
            clean_scientific_name("Puma concolor").as_deref(),
            Some("Puma concolor")
        );
    }

    #[test]
    fn test_parenthetical_author_removed() {
        assert_eq!(
            clean_scientific_name("Rana pipiens (Schreber, 1782)").as_deref(),
            Some("Rana pipiens")
        );
    }

    #[test]
    fn test_subspecies_marker_normalized() {
        assert_eq!(
            clean_scientific_name("Cervus canadensis subsp. nelsoni").as_deref(),
            Some("Cervus canadensis ssp. nelsoni")
        );
    }

    #[test]
    fn test_dangling_variety_marker_dropped() {
        assert_eq!(
            clean_scientific_name("Quercus alba var.").as_deref(),
            Some("Quercus alba")
        );
    }

    #[test]
    fn test_qualifier_truncates() {
        assert_eq!(
            clean_scientific_name("Sorex sp. 2").as_deref(),
            Some("Sorex")
        );
        assert_eq!(
            clean_scientific_name("Oncorhynchus mykiss Columbia Basin pop.").as_deref(),
            Some("Oncorhynchus mykiss")
        );
        assert_eq!(
            clean_scientific_name("Myotis lucifugus / Myotis yumanensis").as_deref(),
            Some("Myotis lucifugus")
        );
    }

    #[test]
    fn test_underscores_and_case() {
        assert_eq!(
            clean_scientific_name("BUFO_BOREAS").as_deref(),
            Some("Bufo boreas")
        );
    }

    #[test]
    fn test_family_prefix_and_question_mark() {
        assert_eq!(
            clean_scientific_name("Family Salmonidae?").as_deref(),
            Some("Salmonidae")
        );
    }

    #[test]
    fn test_empty_result_is_none() {
        assert_eq!(clean_scientific_name("1234"), None);
        assert_eq!(clean_scientific_name("   "), None);
    }
}
