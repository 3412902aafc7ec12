//! Plain-text approximation of TeX math
//!
//! Good enough for a terminal preview: Greek letters and common operators
//! become Unicode, `^`/`_` use super/subscript digits where they exist, and
//! fractions and roots are linearised. Unknown commands are left as written.

const SYMBOLS: &[(&str, &str)] = &[
    ("alpha", "α"),
    ("beta", "β"),
    ("gamma", "γ"),
    ("delta", "δ"),
    ("epsilon", "ε"),
    ("theta", "θ"),
    ("lambda", "λ"),
    ("mu", "μ"),
    ("pi", "π"),
    ("rho", "ρ"),
    ("sigma", "σ"),
    ("tau", "τ"),
    ("phi", "φ"),
    ("omega", "ω"),
    ("Gamma", "Γ"),
    ("Delta", "Δ"),
    ("Sigma", "Σ"),
    ("Omega", "Ω"),
    ("sum", "∑"),
    ("prod", "∏"),
    ("int", "∫"),
    ("infty", "∞"),
    ("partial", "∂"),
    ("nabla", "∇"),
    ("pm", "±"),
    ("times", "×"),
    ("cdot", "·"),
    ("leq", "≤"),
    ("geq", "≥"),
    ("neq", "≠"),
    ("approx", "≈"),
    ("to", "→"),
    ("rightarrow", "→"),
    ("in", "∈"),
    ("exp", "exp"),
    ("log", "log"),
    ("ln", "ln"),
    ("sin", "sin"),
    ("cos", "cos"),
];

const SUPERSCRIPTS: &[(char, char)] = &[
    ('0', '⁰'),
    ('1', '¹'),
    ('2', '²'),
    ('3', '³'),
    ('4', '⁴'),
    ('5', '⁵'),
    ('6', '⁶'),
    ('7', '⁷'),
    ('8', '⁸'),
    ('9', '⁹'),
    ('+', '⁺'),
    ('-', '⁻'),
    ('n', 'ⁿ'),
    ('i', 'ⁱ'),
];

const SUBSCRIPTS: &[(char, char)] = &[
    ('0', '₀'),
    ('1', '₁'),
    ('2', '₂'),
    ('3', '₃'),
    ('4', '₄'),
    ('5', '₅'),
    ('6', '₆'),
    ('7', '₇'),
    ('8', '₈'),
    ('9', '₉'),
    ('+', '₊'),
    ('-', '₋'),
];

/// Convert TeX math source to readable Unicode text
pub fn to_unicode(tex: &str) -> String {
    let chars: Vec<char> = tex.chars().collect();
    let mut pos = 0;
    let mut out = String::new();
    while pos < chars.len() {
        out.push_str(&convert_atom(&chars, &mut pos));
    }
    out
}

/// Convert one token starting at `pos` and advance past it
fn convert_atom(chars: &[char], pos: &mut usize) -> String {
    let c = chars[*pos];
    *pos += 1;
    match c {
        '\\' => convert_command(chars, pos),
        '{' => {
            let inner = take_until_close(chars, pos);
            to_unicode(&inner)
        }
        '}' => String::new(),
        '^' => script(&read_group(chars, pos), SUPERSCRIPTS, '^'),
        '_' => script(&read_group(chars, pos), SUBSCRIPTS, '_'),
        other => other.to_string(),
    }
}

fn convert_command(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < chars.len() && chars[*pos].is_ascii_alphabetic() {
        *pos += 1;
    }
    if start == *pos {
        // Control symbol such as `\,` or `\{`
        return match chars.get(*pos) {
            Some(symbol) => {
                *pos += 1;
                match symbol {
                    ',' | ';' | ' ' | '!' => " ".to_string(),
                    other => other.to_string(),
                }
            }
            None => "\\".to_string(),
        };
    }

    let name: String = chars[start..*pos].iter().collect();
    match name.as_str() {
        "frac" => {
            let numerator = to_unicode(&read_group(chars, pos));
            let denominator = to_unicode(&read_group(chars, pos));
            format!("{}/{}", parenthesize(&numerator), parenthesize(&denominator))
        }
        "sqrt" => {
            let radicand = to_unicode(&read_group(chars, pos));
            format!("√{}", parenthesize(&radicand))
        }
        "left" | "right" => String::new(),
        "quad" | "qquad" => "  ".to_string(),
        _ => SYMBOLS
            .iter()
            .find(|(command, _)| *command == name)
            .map(|(_, symbol)| symbol.to_string())
            .unwrap_or_else(|| format!("\\{}", name)),
    }
}

/// Read a braced group, a command, or a single character as raw TeX
fn read_group(chars: &[char], pos: &mut usize) -> String {
    while *pos < chars.len() && chars[*pos].is_whitespace() {
        *pos += 1;
    }
    let Some(&c) = chars.get(*pos) else {
        return String::new();
    };
    *pos += 1;
    match c {
        '{' => take_until_close(chars, pos),
        '\\' => {
            let start = *pos;
            while *pos < chars.len() && chars[*pos].is_ascii_alphabetic() {
                *pos += 1;
            }
            if start == *pos && *pos < chars.len() {
                *pos += 1;
            }
            std::iter::once('\\').chain(chars[start..*pos].iter().copied()).collect()
        }
        other => other.to_string(),
    }
}

/// Collect raw TeX up to the brace matching one already consumed
fn take_until_close(chars: &[char], pos: &mut usize) -> String {
    let mut depth = 1;
    let mut inner = String::new();
    while let Some(&c) = chars.get(*pos) {
        *pos += 1;
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        inner.push(c);
    }
    inner
}

fn script(raw: &str, table: &[(char, char)], marker: char) -> String {
    let converted = to_unicode(raw);
    let mapped: Option<String> = converted
        .chars()
        .map(|c| table.iter().find(|(from, _)| *from == c).map(|(_, to)| *to))
        .collect();
    match mapped {
        Some(s) if !s.is_empty() => s,
        _ => format!("{}{}", marker, parenthesize(&converted)),
    }
}

fn parenthesize(s: &str) -> String {
    if s.chars().count() <= 1 || s.chars().all(|c| c.is_ascii_digit()) {
        s.to_string()
    } else {
        format!("({})", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superscript_digits() {
        assert_eq!(to_unicode("E = mc^2"), "E = mc²");
        assert_eq!(to_unicode("x^{10}"), "x¹⁰");
    }

    #[test]
    fn test_subscript_and_fallback() {
        assert_eq!(to_unicode("a_1"), "a₁");
        assert_eq!(to_unicode("x_{ij}"), "x_(ij)");
    }

    #[test]
    fn test_greek_and_operators() {
        assert_eq!(to_unicode("\\alpha \\leq \\pi"), "α ≤ π");
        assert_eq!(to_unicode("\\sum_{i} x_i"), "∑_i x_i");
    }

    #[test]
    fn test_fraction_and_root() {
        assert_eq!(to_unicode("\\frac{1}{2}"), "1/2");
        assert_eq!(to_unicode("\\frac{a+b}{c}"), "(a+b)/c");
        assert_eq!(to_unicode("\\sigma\\sqrt{2\\pi}"), "σ√(2π)");
    }

    #[test]
    fn test_left_right_dropped() {
        assert_eq!(to_unicode("\\left( x \\right)"), "( x )");
    }

    #[test]
    fn test_unknown_command_kept() {
        assert_eq!(to_unicode("\\mathbb{R}"), "\\mathbbR");
    }
}
