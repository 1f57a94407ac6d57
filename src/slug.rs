/// Derive a filesystem-safe token from a track name.
///
/// Lowercase, common Latin diacritics folded to ASCII, every run of other
/// characters collapsed to a single hyphen, no leading/trailing hyphens.
/// Idempotent: slugifying a slug returns it unchanged.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut gap = false;
    for ch in text.chars() {
        // Combining marks (NFD residue) vanish entirely instead of becoming
        // separators.
        if ('\u{0300}'..='\u{036f}').contains(&ch) {
            continue;
        }
        let folded = fold_latin(ch);
        let mut emitted = false;
        match folded {
            Some(ascii) => {
                for f in ascii.chars() {
                    push_alnum(&mut out, f, &mut gap);
                    emitted = true;
                }
            }
            None => {
                for f in ch.to_lowercase() {
                    if f.is_ascii_alphanumeric() {
                        push_alnum(&mut out, f, &mut gap);
                        emitted = true;
                    }
                }
            }
        }
        if !emitted {
            gap = true;
        }
    }
    out
}

fn push_alnum(out: &mut String, ch: char, gap: &mut bool) {
    if *gap && !out.is_empty() {
        out.push('-');
    }
    *gap = false;
    out.push(ch);
}

/// ASCII fold for the Latin accented letters that show up in track names.
fn fold_latin(ch: char) -> Option<&'static str> {
    Some(match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ñ' | 'Ñ' => "n",
        'ç' | 'Ç' => "c",
        'š' | 'Š' => "s",
        'ž' | 'Ž' => "z",
        'đ' | 'Đ' | 'ð' | 'Ð' => "d",
        'þ' | 'Þ' => "th",
        'æ' | 'Æ' => "ae",
        'œ' | 'Œ' => "oe",
        'ß' => "ss",
        _ => return None,
    })
}
