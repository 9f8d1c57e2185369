/// Identity key normalization.
///
/// Names and affiliations arrive with inconsistent whitespace, stray
/// diacritics on romanized entries, and mixed casing from different
/// tournament operators. Normalization here is purely orthographic:
/// two sightings compare equal only when they would look the same to a
/// human reading the entry list. No phonetic matching.

/// Normalized (name, affiliation) pair used for player lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub name: String,
    pub affiliation: String,
}

pub fn identity_key(name: &str, affiliation: &str) -> IdentityKey {
    IdentityKey {
        name: normalize_name(name),
        affiliation: normalize_affiliation(affiliation),
    }
}

/// Collapse whitespace and fold Latin diacritics. Case is preserved:
/// Korean names have no case, and romanized entries are cased
/// consistently by the source systems.
pub fn normalize_name(raw: &str) -> String {
    let folded: String = raw.chars().map(fold_latin_diacritic).collect();
    collapse_whitespace(&folded)
}

/// Affiliations are free-text club or school names; case-fold as well
/// since operators type them by hand.
pub fn normalize_affiliation(raw: &str) -> String {
    collapse_whitespace(raw).to_lowercase()
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map accented Latin letters onto their base letter. Only the ranges
/// observed in romanized entry lists are covered; anything else passes
/// through unchanged.
fn fold_latin_diacritic(c: char) -> char {
    match c {
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'À'..='Å' | 'Ā' | 'Ă' | 'Ą' => 'A',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'È'..='Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => 'E',
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'Ì'..='Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' | 'İ' => 'I',
        'ò'..='ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'Ò'..='Ö' | 'Ø' | 'Ō' | 'Ŏ' | 'Ő' => 'O',
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'Ù'..='Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => 'U',
        'ç' | 'ć' | 'ĉ' | 'č' => 'c',
        'Ç' | 'Ć' | 'Ĉ' | 'Č' => 'C',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'Ñ' | 'Ń' | 'Ņ' | 'Ň' => 'N',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'Ś' | 'Ŝ' | 'Ş' | 'Š' => 'S',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        'ź' | 'ż' | 'ž' => 'z',
        'Ź' | 'Ż' | 'Ž' => 'Z',
        'ł' => 'l',
        'Ł' => 'L',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_inner_whitespace() {
        assert_eq!(normalize_name("  김  철수 "), "김 철수");
        assert_eq!(normalize_name("Kim\tChul  Soo"), "Kim Chul Soo");
    }

    #[test]
    fn folds_latin_diacritics_but_keeps_case() {
        assert_eq!(normalize_name("Łukasz Gołąb"), "Lukasz Golab");
        assert_eq!(normalize_name("José"), "Jose");
        assert_ne!(normalize_name("KIM"), normalize_name("kim"));
    }

    #[test]
    fn affiliation_is_case_insensitive() {
        assert_eq!(
            normalize_affiliation("Seoul  Fencing Club"),
            normalize_affiliation("seoul fencing CLUB")
        );
    }

    #[test]
    fn identical_visual_names_share_a_key() {
        let a = identity_key("김철수", "서울펜싱클럽");
        let b = identity_key(" 김철수 ", "서울펜싱클럽");
        assert_eq!(a, b);
    }
}
