/// Strips tag-shaped runs (`<` up to and including the next `>`) from
/// provider instruction text. A `<` with no closing `>` swallows the rest of
/// the input. Entities and whitespace are left as they are.
pub fn strip_markup(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;

    for ch in html.chars() {
        match (in_tag, ch) {
            (false, '<') => in_tag = true,
            (false, _) => out.push(ch),
            (true, '>') => in_tag = false,
            (true, _) => {}
        }
    }

    out
}
