use super::*;
use chrono::Utc;

#[test]
fn parses_posix_locale_with_encoding() {
    let locale = Locale::parse("zh_CN.UTF-8").expect("locale");
    assert_eq!(locale.tag(), "zh-CN");
    assert_eq!(locale.language(), CaptionLanguage::Chinese);
}

#[test]
fn parses_bcp47_script_subtag() {
    let locale = Locale::parse("zh-Hans-CN").expect("locale");
    assert_eq!(locale.tag(), "zh-Hans-CN");
    assert!(locale.language().is_chinese());
}

#[test]
fn rejects_c_and_posix_locales() {
    assert!(Locale::parse("C").is_none());
    assert!(Locale::parse("C.UTF-8").is_none());
    assert!(Locale::parse("POSIX").is_none());
    assert!(Locale::parse("").is_none());
}

#[test]
fn lookup_prefers_lc_all_then_falls_through() {
    let locale = Locale::from_lookup(|key| match key {
        "LC_ALL" => Some("C".to_string()),
        "LANG" => Some("de_DE@euro".to_string()),
        _ => None,
    });
    assert_eq!(locale.tag(), "de-DE");
    assert_eq!(locale.language(), CaptionLanguage::German);
}

#[test]
fn lookup_defaults_to_english() {
    let locale = Locale::from_lookup(|_| None);
    assert_eq!(locale, Locale::default());
    assert_eq!(locale.language(), CaptionLanguage::English);
}

#[test]
fn unknown_languages_map_to_english() {
    let locale = Locale::parse("pt_BR").expect("locale");
    assert_eq!(locale.language(), CaptionLanguage::English);
}

#[test]
fn formats_timestamp_per_language() {
    let at = Utc
        .with_ymd_and_hms(2026, 3, 7, 9, 5, 0)
        .single()
        .expect("timestamp");
    assert_eq!(
        Locale::default().format_timestamp(&at),
        "Mar 7, 2026 09:05"
    );
    assert_eq!(
        Locale::parse("zh_CN").expect("zh").format_timestamp(&at),
        "2026年03月07日 09:05"
    );
    assert_eq!(
        Locale::parse("de_DE").expect("de").format_timestamp(&at),
        "07.03.2026 09:05"
    );
    assert_eq!(
        Locale::parse("en_GB").expect("en-GB").format_timestamp(&at),
        "7 Mar 2026 09:05"
    );
}
