//! VerTeX → LaTeX translation plus HTML-escaping, bundled into a single
//! "V&E" (vertex-and-escape) function that is meant to have exactly two call
//! sites in the whole workspace: the JSON sublanguage's string literal rule
//! (`json::Parser::ve_string`), and annotation markdown rendering
//! (`markdown::render_anno_markdown`). Any other consumer must treat strings
//! as already escaped.

/// The keychar that introduces a VerTeX shorthand, e.g. `\al` for `\alpha`.
pub const VERTEX_KEY_CHAR: char = '\\';

/// A representative slice of the VerTeX table: a keychar followed by a short
/// name maps to the corresponding TeX command, e.g. `\al` → `\alpha`, `\Ga`
/// → `\Gamma`, `\empty` → `\emptyset`. The full table in the original
/// implementation lives in the external `vertex2tex` package (out of
/// budget); this subset covers the letters and the one common symbol the
/// grammar's test fixtures exercise, and is extended the same way.
const VERTEX_TABLE: &[(&str, &str)] = &[
    ("al", "alpha"),
    ("Al", "Alpha"),
    ("be", "beta"),
    ("Be", "Beta"),
    ("ga", "gamma"),
    ("Ga", "Gamma"),
    ("de", "delta"),
    ("De", "Delta"),
    ("ep", "epsilon"),
    ("Ep", "Epsilon"),
    ("ze", "zeta"),
    ("Ze", "Zeta"),
    ("et", "eta"),
    ("Et", "Eta"),
    ("th", "theta"),
    ("Th", "Theta"),
    ("io", "iota"),
    ("Io", "Iota"),
    ("ka", "kappa"),
    ("Ka", "Kappa"),
    ("la", "lambda"),
    ("La", "Lambda"),
    ("mu", "mu"),
    ("Mu", "Mu"),
    ("nu", "nu"),
    ("Nu", "Nu"),
    ("xi", "xi"),
    ("Xi", "Xi"),
    ("pi", "pi"),
    ("Pi", "Pi"),
    ("rh", "rho"),
    ("Rh", "Rho"),
    ("si", "sigma"),
    ("Si", "Sigma"),
    ("ta", "tau"),
    ("Ta", "Tau"),
    ("up", "upsilon"),
    ("Up", "Upsilon"),
    ("ph", "phi"),
    ("Ph", "Phi"),
    ("ch", "chi"),
    ("Ch", "Chi"),
    ("ps", "psi"),
    ("Ps", "Psi"),
    ("om", "omega"),
    ("Om", "Omega"),
    ("empty", "emptyset"),
];

/// The longest table key that prefixes `rest`, if any, with its replacement.
/// Longest-match-first so `\empty` isn't shadowed by a shorter code.
fn longest_match(rest: &[char]) -> Option<(usize, &'static str)> {
    let mut best: Option<(usize, &'static str)> = None;
    for (key, value) in VERTEX_TABLE {
        let klen = key.chars().count();
        if klen > rest.len() || best.is_some_and(|(blen, _)| klen <= blen) {
            continue;
        }
        if rest[..klen].iter().copied().eq(key.chars()) {
            best = Some((klen, value));
        }
    }
    best
}

/// Translate VerTeX shorthand into ordinary TeX. A keychar followed by a
/// recognised short name becomes `\command`; any other keychar occurrence
/// (escaped keychar, or unrecognised name) is left untouched so plain text
/// containing the keychar is not corrupted.
pub fn translate_vertex(input: &str, keychar: char) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c != keychar {
            out.push(c);
            i += 1;
            continue;
        }
        match longest_match(&chars[i + 1..]) {
            Some((matched_len, replacement)) => {
                out.push('\\');
                out.push_str(replacement);
                i += 1 + matched_len;
            }
            None => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Minimal HTML escaper covering the five characters that matter for XSS
/// safety in attribute and text contexts.
pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// The V&E pipeline: VerTeX translation, then HTML escaping. Every
/// author-supplied string in pfsc syntax passes through this exactly once.
pub fn vertex_and_escape(s: &str) -> String {
    html_escape(&translate_vertex(s, VERTEX_KEY_CHAR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_lowercase_greek() {
        assert_eq!(translate_vertex("\\al + \\be", '\\'), "\\alpha + \\beta");
    }

    #[test]
    fn translates_uppercase_greek() {
        assert_eq!(translate_vertex("\\Ga", '\\'), "\\Gamma");
    }

    #[test]
    fn translates_multichar_symbol_name() {
        assert_eq!(translate_vertex("\\empty", '\\'), "\\emptyset");
    }

    #[test]
    fn leaves_unrecognised_name_alone() {
        assert_eq!(translate_vertex("\\xx", '\\'), "\\xx");
    }

    #[test]
    fn escapes_after_translation() {
        assert_eq!(vertex_and_escape("<\\al>"), "&lt;\\alpha&gt;");
    }

    #[test]
    fn escapes_quotes_and_amp() {
        assert_eq!(html_escape("a \"b\" & 'c'"), "a &quot;b&quot; &amp; &#x27;c&#x27;");
    }
}
