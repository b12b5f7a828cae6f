//! Pure helpers for media naming: upload sanitization, extension
//! classification, and date-prefix normalization.

/// Extensions accepted at upload time.
const UPLOAD_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "heif", "mp4"];

/// Extensions the display client can render. HEIC/HEIF are accepted for
/// storage but never selected for display.
const DISPLAY_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "mp4"];

const MAX_NAME_CHARS: usize = 80;
const FALLBACK_NAME: &str = "file";

/// Reduce a client-supplied file name to something safe for the media tree.
///
/// Any path components are stripped, characters outside
/// letters/digits/space/`-_.()` become `_`, and only the trailing 80
/// characters are kept so the extension survives truncation.
pub fn sanitize_file_name(name: &str) -> String {
    let name = name.replace('\\', "/");
    let name = match name.rsplit_once('/') {
        Some((_, base)) => base,
        None => name.as_str(),
    };

    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() {
        sanitized = FALLBACK_NAME.to_string();
    }

    let chars = sanitized.chars().count();
    if chars > MAX_NAME_CHARS {
        sanitized = sanitized.chars().skip(chars - MAX_NAME_CHARS).collect();
    }

    sanitized
}

fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Returns `true` if `name` carries an extension accepted at upload time.
pub fn has_allowed_extension(name: &str) -> bool {
    if name.trim().is_empty() {
        return false;
    }
    extension_of(name).is_some_and(|ext| UPLOAD_EXTENSIONS.contains(&ext.as_str()))
}

/// Returns `true` if the entry can be handed to the display client.
pub fn is_displayable(rel: &str) -> bool {
    extension_of(rel).is_some_and(|ext| DISPLAY_EXTENSIONS.contains(&ext.as_str()))
}

/// Returns `true` for video entries, which suppress time-based rotation
/// until an explicit advance.
pub fn is_video(rel: &str) -> bool {
    extension_of(rel).is_some_and(|ext| ext == "mp4")
}

/// Normalize a date in `yyyyMMdd`, `yyyy-MM-dd`, or `yyyy/MM/dd` form to
/// the canonical `"yyyy/mm/dd/"` queue prefix. Unrecognized or out-of-range
/// input means "no filter" and yields `None`.
pub fn normalize_date_prefix(text: &str) -> Option<String> {
    let d = text.trim();
    let b = d.as_bytes();

    let (year, month, day) = if b.len() == 8 && b.iter().all(u8::is_ascii_digit) {
        (&d[0..4], &d[4..6], &d[6..8])
    } else if b.len() == 10 && separated_date(b, b'-') {
        (&d[0..4], &d[5..7], &d[8..10])
    } else if b.len() == 10 && separated_date(b, b'/') {
        (&d[0..4], &d[5..7], &d[8..10])
    } else {
        return None;
    };

    let m: u32 = month.parse().ok()?;
    let dd: u32 = day.parse().ok()?;
    if !(1..=12).contains(&m) || !(1..=31).contains(&dd) {
        return None;
    }

    Some(format!("{year}/{month}/{day}/"))
}

fn separated_date(b: &[u8], sep: u8) -> bool {
    b[4] == sep
        && b[7] == sep
        && [0, 1, 2, 3, 5, 6, 8, 9]
            .iter()
            .all(|&i| b[i].is_ascii_digit())
}
