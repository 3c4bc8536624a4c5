use whatlang::{Lang, detect};

const MIN_CONFIDENCE: f64 = 0.25;
const MIN_TEXT_LENGTH: usize = 50;

/// Detect the language of `text`, or `None` when it is too short or the
/// detector is unsure.
pub fn detect_language(text: &str) -> Option<Lang> {
    if text.trim().len() < MIN_TEXT_LENGTH {
        return None;
    }

    detect(text)
        .filter(|info| info.confidence() >= MIN_CONFIDENCE)
        .map(|info| info.lang())
}

/// Resolve a configured language ("French", "fr", "fra", "Français") to a
/// whatlang language.
pub fn parse_language(name: &str) -> Option<Lang> {
    let name = name.trim().to_lowercase();
    if let Some(lang) = Lang::from_code(&name) {
        return Some(lang);
    }
    Lang::all()
        .iter()
        .copied()
        .find(|lang| {
            lang.eng_name().to_lowercase() == name
                || lang.name().to_lowercase() == name
                || two_letter_code(*lang) == Some(name.as_str())
        })
}

/// The detected language of `text` when it differs from `expected`.
///
/// Returns `None` when they agree or when either side cannot be determined.
pub fn language_mismatch(text: &str, expected: &str) -> Option<Lang> {
    let expected = parse_language(expected)?;
    let detected = detect_language(text)?;
    (detected != expected).then_some(detected)
}

fn two_letter_code(lang: Lang) -> Option<&'static str> {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Rus => "ru",
        Lang::Cmn => "zh",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Nld => "nl",
        Lang::Pol => "pl",
        Lang::Tur => "tr",
        Lang::Swe => "sv",
        Lang::Dan => "da",
        Lang::Fin => "fi",
        Lang::Heb => "he",
        Lang::Ara => "ar",
        Lang::Hin => "hi",
        Lang::Tha => "th",
        Lang::Vie => "vi",
        _ => return None,
    };
    Some(code)
}
