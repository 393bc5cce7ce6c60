//! Identifier casing used by the build's generated accessor macros.

/// Map a devicetree node or property name to its macro-identifier form.
///
/// Lower-cases and replaces `@`, `,` and `-` with `_`, so
/// `clock-frequency` becomes `clock_frequency` and `uart@1000` becomes
/// `uart_1000`.
pub fn to_macro_ident(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '@' | ',' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Token form of a string value: every non-alphanumeric character becomes `_`.
/// Letter case is preserved.
pub fn to_string_token(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Upper-cased token form of a string value.
pub fn to_upper_token(value: &str) -> String {
    to_string_token(value).to_ascii_uppercase()
}
